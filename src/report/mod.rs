// src/report/mod.rs

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::combine::Operation;
use crate::types::CombinedTable;

pub const SERIAL_COLUMN: &str = "serial";
pub const SYMBOL_COLUMN: &str = "symbol";
pub const APPEARANCES_COLUMN: &str = "appearances";
pub const CONDITIONS_COLUMN: &str = "conditions met";

/// `<input-stem>_<operation>.csv` in the working directory.
pub fn output_path(input: &Path, operation: Operation) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "conditions".to_string());
    PathBuf::from(format!("{}_{}.csv", stem, operation))
}

/// Header row for `table`. Attribute columns keep first-seen order; the
/// column each symbol was read from is folded into `symbol`.
pub fn columns(table: &CombinedTable) -> Vec<String> {
    let mut attributes: Vec<String> = Vec::new();
    for combined in &table.rows {
        for col in combined.row.columns() {
            let is_symbol = combined.symbol_column == Some(col.as_str());
            let reserved = matches!(
                col.as_str(),
                SERIAL_COLUMN | SYMBOL_COLUMN | APPEARANCES_COLUMN | CONDITIONS_COLUMN
            );
            if !is_symbol && !reserved && !attributes.contains(col) {
                attributes.push(col.clone());
            }
        }
    }

    let mut header = Vec::with_capacity(attributes.len() + 4);
    if !table.is_empty() {
        header.push(SERIAL_COLUMN.to_string());
    }
    header.push(SYMBOL_COLUMN.to_string());
    header.extend(attributes);
    header.push(APPEARANCES_COLUMN.to_string());
    header.push(CONDITIONS_COLUMN.to_string());
    header
}

/// Write `table` as CSV. An empty table still gets its header row.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display(), rows = table.len()))]
pub fn write_report(path: impl AsRef<Path>, table: &CombinedTable) -> Result<()> {
    let path = path.as_ref();
    let header = columns(table);
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating report {}", path.display()))?;
    wtr.write_record(&header)?;

    for (i, combined) in table.rows.iter().enumerate() {
        let record: Vec<String> = header
            .iter()
            .map(|col| match col.as_str() {
                SERIAL_COLUMN => (i + 1).to_string(),
                SYMBOL_COLUMN => combined.symbol.clone(),
                APPEARANCES_COLUMN => combined.appearances.to_string(),
                CONDITIONS_COLUMN => combined.conditions_joined(),
                other => combined.row.cell(other),
            })
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()
        .with_context(|| format!("flushing report {}", path.display()))?;
    debug!(columns = header.len(), "report written");
    Ok(())
}

/// The combination columns of one report line.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ReportRecord {
    pub symbol: String,
    pub appearances: usize,
    #[serde(rename = "conditions met")]
    pub conditions_met: String,
}

/// Read back the `symbol`, `appearances` and `conditions met` columns of a report.
pub fn read_report(path: impl AsRef<Path>) -> Result<Vec<ReportRecord>> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening report {}", path.display()))?;
    rdr.deserialize()
        .collect::<Result<Vec<ReportRecord>, _>>()
        .with_context(|| format!("parsing report {}", path.display()))
}
