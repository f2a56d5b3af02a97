// src/fetch/mod.rs

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;

pub mod scan;
pub mod session;

pub use session::{extract_csrf_token, Session};

/// The three requests the screener conversation needs.
/// Implemented over HTTP by [`HttpScreener`]; tests substitute canned responses.
#[async_trait]
pub trait ScreenerApi: Send + Sync {
    /// GET the screener landing page.
    async fn fetch_home(&self) -> Result<String, FetchError>;

    /// GET an arbitrary screener page, e.g. a saved scan.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;

    /// POST a scan clause and return the raw JSON body.
    async fn post_scan(&self, csrf_token: &str, clause: &str) -> Result<String, FetchError>;
}

/// reqwest-backed [`ScreenerApi`]. Keeps a cookie store so the session
/// cookie issued alongside the csrf token is sent back with every scan.
pub struct HttpScreener {
    client: Client,
    home_url: String,
    process_url: String,
    home_timeout: Duration,
    scan_timeout: Duration,
}

impl HttpScreener {
    pub fn new(cfg: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(cfg.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            home_url: cfg.home_url.clone(),
            process_url: cfg.process_url.clone(),
            home_timeout: cfg.home_timeout,
            scan_timeout: cfg.scan_timeout,
        })
    }

    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        debug!("Fetching text from {}", url);
        self.client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| FetchError::from_reqwest(url, e))?
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}

#[async_trait]
impl ScreenerApi for HttpScreener {
    async fn fetch_home(&self) -> Result<String, FetchError> {
        self.get_text(&self.home_url, self.home_timeout).await
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.get_text(url, self.home_timeout).await
    }

    async fn post_scan(&self, csrf_token: &str, clause: &str) -> Result<String, FetchError> {
        let url = self.process_url.as_str();
        debug!(url, clause_len = clause.len(), "Posting scan clause");
        self.client
            .post(url)
            .timeout(self.scan_timeout)
            .header("x-csrf-token", csrf_token)
            .header("x-requested-with", "XMLHttpRequest")
            .form(&[("scan_clause", clause)])
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| FetchError::from_reqwest(url, e))?
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}
