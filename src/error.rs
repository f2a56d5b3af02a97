// src/error.rs

use std::path::PathBuf;

/// Failure to obtain a usable screener session. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("screener home page unreachable: {0}")]
    Unreachable(#[source] FetchError),

    #[error("csrf-token meta tag not found on home page")]
    MissingToken,

    #[error("csrf-token meta tag is empty")]
    EmptyToken,
}

/// Failure fetching a single condition. Recovered by skipping that condition.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("screener rejected the scan clause: {0}")]
    Scan(String),

    #[error("no scan clause found on page {0}")]
    MissingClause(String),
}

impl FetchError {
    /// Classify a reqwest failure against `url`.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Bad invocation or unusable input. Raised before any network activity.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid mode `{0}`; expected one of: intersect, union, all")]
    InvalidMode(String),

    #[error("custom separator must not be empty")]
    EmptySeparator,
}

/// History file problems. `Corrupt` never reaches the user.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history file {} is unreadable: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("writing history file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Run-level failures of the fetch pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("no data fetched: {attempted} condition(s) attempted, none succeeded")]
    NoData { attempted: usize },
}
