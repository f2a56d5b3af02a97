// src/config.rs

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOME_URL: &str = "https://chartink.com/screener";
pub const DEFAULT_PROCESS_URL: &str = "https://chartink.com/screener/process";

/// Shortest pause allowed between two screener requests.
pub const MIN_REQUEST_DELAY: Duration = Duration::from_secs(1);

/// Days of history kept and considered by the windowed intersect.
pub const RETENTION_DAYS: i64 = 7;

const HISTORY_DIR: &str = ".scanmerge";
const HISTORY_FILE: &str = "history.json";

/// Runtime settings for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub home_url: String,
    pub process_url: String,
    pub home_timeout: Duration,
    pub scan_timeout: Duration,
    pub request_delay: Duration,
    pub history_path: PathBuf,
    pub retention_days: i64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_url: DEFAULT_HOME_URL.to_string(),
            process_url: DEFAULT_PROCESS_URL.to_string(),
            home_timeout: Duration::from_secs(10),
            scan_timeout: Duration::from_secs(30),
            request_delay: MIN_REQUEST_DELAY,
            history_path: default_history_path(),
            retention_days: RETENTION_DAYS,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Point both endpoints at another screener host, e.g. a local mirror.
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.home_url = format!("{}/screener", base);
        self.process_url = format!("{}/screener/process", base);
        self
    }
}

/// `~/.scanmerge/history.json`, or the working directory when no home is known.
pub fn default_history_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(HISTORY_DIR)
        .join(HISTORY_FILE)
}
