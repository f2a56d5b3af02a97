// src/pipeline.rs

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use std::{path::PathBuf, time::Duration};
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::combine::{self, Operation};
use crate::conditions::{load_conditions, LoadMode};
use crate::error::PipelineError;
use crate::fetch::{ScreenerApi, Session};
use crate::history::{market_now, HistoryEntry, HistoryStore};
use crate::report;
use crate::types::{CombinedTable, FetchedCondition, FilterDefinition};

/// Whether `intersect` counts conditions of this run or days of history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IntersectScope {
    #[default]
    SingleRun,
    History,
}

/// Everything one invocation needs, after arguments and prompts are settled.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub operation: Operation,
    pub input: PathBuf,
    pub output: PathBuf,
    pub load_mode: LoadMode,
    pub threshold: usize,
    pub scope: IntersectScope,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCondition {
    /// 1-based position in the input file.
    pub index: usize,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct FetchReport {
    pub fetched: Vec<FetchedCondition>,
    pub skipped: Vec<SkippedCondition>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub output: PathBuf,
    pub rows: usize,
    pub fetched: usize,
    pub skipped: Vec<SkippedCondition>,
    pub history_saved: bool,
}

/// Run every condition in order, one request at a time, pausing `delay`
/// after each. Failed conditions are logged and skipped; it is an error only
/// when none succeed.
#[instrument(level = "info", skip_all, fields(conditions = filters.len()))]
pub async fn fetch_all<A: ScreenerApi>(
    session: &Session<A>,
    filters: &[FilterDefinition],
    delay: Duration,
) -> Result<FetchReport, PipelineError> {
    let mut report = FetchReport::default();
    let total = filters.len();

    for (i, filter) in filters.iter().enumerate() {
        let index = i + 1;
        info!(index, total, name = %filter.name, "fetching condition");
        match session.fetch_condition(filter).await {
            Ok(rows) => {
                if rows.is_empty() {
                    info!(index, name = %filter.name, "no results");
                } else {
                    info!(index, name = %filter.name, rows = rows.len(), "fetched");
                }
                report.fetched.push(FetchedCondition {
                    filter: filter.clone(),
                    rows,
                });
            }
            Err(e) => {
                warn!(index, name = %filter.name, error = %e, "skipped condition");
                report.skipped.push(SkippedCondition {
                    index,
                    name: filter.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
        sleep(delay).await;
    }

    if report.fetched.is_empty() {
        return Err(PipelineError::NoData { attempted: total });
    }
    Ok(report)
}

/// Combine one run's results for `request`, recording its "all" table in
/// history first. A history write failure is logged and the combination
/// continues from what could be read.
pub fn combine_results(
    fetched: &[FetchedCondition],
    request: &RunRequest,
    store: &HistoryStore,
    now: DateTime<FixedOffset>,
) -> (CombinedTable, bool) {
    let all = combine::all(fetched);
    let filename = request
        .output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let entry = HistoryEntry::from_table(&all, filename, now);
    let today = now.date_naive();

    let (entries, saved) = match store.append_as_of(entry.clone(), today) {
        Ok(entries) => (entries, true),
        Err(e) => {
            warn!(error = %e, "could not save history");
            let mut entries = store.load_as_of(today);
            entries.push(entry);
            (entries, false)
        }
    };

    let table = match (request.operation, request.scope) {
        (Operation::Union, _) => combine::union(fetched),
        (Operation::All, _) => all,
        (Operation::Intersect, IntersectScope::SingleRun) => {
            combine::intersect(fetched, request.threshold)
        }
        (Operation::Intersect, IntersectScope::History) => {
            info!(entries = entries.len(), "intersecting over history");
            combine::intersect_over_history(&entries, &all, request.threshold, today)
        }
    };
    (table, saved)
}

/// Load, authenticate, fetch, combine, write.
pub async fn execute<A: ScreenerApi>(
    api: A,
    store: &HistoryStore,
    request: &RunRequest,
    delay: Duration,
) -> Result<RunSummary> {
    let filters = load_conditions(&request.input, &request.load_mode)?;
    if filters.is_empty() {
        return Err(PipelineError::NoData { attempted: 0 }.into());
    }

    let session = Session::bootstrap(api)
        .await
        .map_err(PipelineError::from)?;
    let fetch = fetch_all(&session, &filters, delay).await?;

    let (table, history_saved) = combine_results(&fetch.fetched, request, store, market_now());
    if table.is_empty() {
        match request.operation {
            Operation::Intersect => warn!(
                threshold = request.threshold,
                "no symbols met the minimum appearance threshold"
            ),
            _ => warn!("no symbols matched any condition"),
        }
    }

    report::write_report(&request.output, &table)
        .with_context(|| format!("writing {}", request.output.display()))?;
    info!(output = %request.output.display(), rows = table.len(), "output saved");

    Ok(RunSummary {
        output: request.output.clone(),
        rows: table.len(),
        fetched: fetch.fetched.len(),
        skipped: fetch.skipped,
        history_saved,
    })
}
