// src/fetch/scan.rs

use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{ScreenerApi, Session};
use crate::error::FetchError;
use crate::types::{FilterDefinition, ResultRow};

/// Body of a `/screener/process` response. Only `data` matters; the
/// service reports rejected clauses through `scan_error`.
#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    data: Option<Vec<ResultRow>>,
    #[serde(default)]
    scan_error: Option<String>,
}

/// Parse a scan response body. Zero matches is an empty vector, not an error.
pub fn parse_scan_response(body: &str) -> Result<Vec<ResultRow>, FetchError> {
    let resp: ScanResponse = serde_json::from_str(body)?;
    if let Some(msg) = resp.scan_error.filter(|m| !m.trim().is_empty()) {
        return Err(FetchError::Scan(msg));
    }
    Ok(resp.data.unwrap_or_default())
}

/// True for `http(s)://` expressions, which name a saved screener page.
pub fn is_screener_url(expression: &str) -> bool {
    Url::parse(expression.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Take the scan clause out of a saved screener page's first non-empty `<textarea>`.
pub fn extract_scan_clause(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("textarea").expect("selector should parse");
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|clause| !clause.is_empty())
}

impl<A: ScreenerApi> Session<A> {
    /// The clause to post for `expression`: verbatim, or scraped from the page it links to.
    pub async fn resolve_clause(&self, expression: &str) -> Result<String, FetchError> {
        let expression = expression.trim();
        if !is_screener_url(expression) {
            return Ok(expression.to_string());
        }
        let html = self.api().fetch_page(expression).await?;
        let clause = extract_scan_clause(&html)
            .ok_or_else(|| FetchError::MissingClause(expression.to_string()))?;
        debug!(url = expression, clause_len = clause.len(), "resolved clause from page");
        Ok(clause)
    }

    /// Run one condition against the screener.
    #[instrument(level = "debug", skip(self, filter), fields(name = %filter.name))]
    pub async fn fetch_condition(
        &self,
        filter: &FilterDefinition,
    ) -> Result<Vec<ResultRow>, FetchError> {
        let clause = self.resolve_clause(&filter.expression).await?;
        let body = self.api().post_scan(self.token(), &clause).await?;
        let rows = parse_scan_response(&body)?;
        debug!(rows = rows.len(), "scan returned");
        Ok(rows)
    }
}
