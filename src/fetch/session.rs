// src/fetch/session.rs

use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

use super::ScreenerApi;
use crate::error::AuthError;

/// An authenticated conversation with the screener: the transport plus the
/// csrf token scraped from the landing page.
pub struct Session<A> {
    api: A,
    token: String,
}

impl<A: ScreenerApi> Session<A> {
    /// Single attempt: GET the home page and pull out its csrf token.
    #[instrument(level = "info", skip(api))]
    pub async fn bootstrap(api: A) -> Result<Self, AuthError> {
        let html = api.fetch_home().await.map_err(|e| {
            warn!(error = %e, "home page fetch failed");
            AuthError::Unreachable(e)
        })?;
        let token = extract_csrf_token(&html)?;
        info!(token_len = token.len(), "session ready");
        Ok(Self { api, token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

/// Read `<meta name="csrf-token" content="...">` from a page.
pub fn extract_csrf_token(html: &str) -> Result<String, AuthError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[name="csrf-token"]"#).expect("selector should parse");

    let meta = document
        .select(&selector)
        .next()
        .ok_or(AuthError::MissingToken)?;
    let token = meta
        .value()
        .attr("content")
        .map(str::trim)
        .unwrap_or_default();
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fake::FakeScreener;

    #[test]
    fn extracts_token() {
        let html = r#"<html><head><meta charset="utf-8">
            <meta name="csrf-token" content=" abcDEF123 "></head></html>"#;
        assert_eq!(extract_csrf_token(html).unwrap(), "abcDEF123");
    }

    #[test]
    fn missing_and_empty_tokens_are_distinct() {
        assert!(matches!(
            extract_csrf_token("<html><head></head></html>"),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            extract_csrf_token(r#"<meta name="csrf-token" content="">"#),
            Err(AuthError::EmptyToken)
        ));
        assert!(matches!(
            extract_csrf_token(r#"<meta name="csrf-token">"#),
            Err(AuthError::EmptyToken)
        ));
    }

    #[tokio::test]
    async fn bootstrap_keeps_token() {
        let session = Session::bootstrap(FakeScreener::new()).await.unwrap();
        assert_eq!(session.token(), "tok-123");
    }

    #[tokio::test]
    async fn bootstrap_fails_when_home_unreachable() {
        let mut api = FakeScreener::new();
        api.home = None;
        let err = Session::bootstrap(api).await.err().unwrap();
        assert!(matches!(err, AuthError::Unreachable(_)));
    }
}
