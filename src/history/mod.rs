// src/history/mod.rs

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Asia::Kolkata;
use serde::{Deserialize, Serialize};

use crate::types::CombinedTable;

pub mod store;

pub use store::{prune, HistoryStore};

/// The only operation recorded in history.
pub const ALL_OPERATION: &str = "all";

/// Current time on the exchange's clock. History dates use this zone so a
/// late-evening run lands on the trading day it belongs to.
pub fn market_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&Kolkata).fixed_offset()
}

pub fn market_today() -> NaiveDate {
    market_now().date_naive()
}

/// One symbol of a persisted "all" result.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct HistoryRecord {
    pub symbol: String,
    pub conditions_met: Vec<String>,
}

/// One run's "all" result as stored in the history file.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub timestamp: DateTime<FixedOffset>,
    pub filename: String,
    pub operation: String,
    pub records: Vec<HistoryRecord>,
}

impl HistoryEntry {
    pub fn from_table(
        table: &CombinedTable,
        filename: impl Into<String>,
        now: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            date: now.date_naive(),
            timestamp: now,
            filename: filename.into(),
            operation: ALL_OPERATION.to_string(),
            records: table
                .rows
                .iter()
                .map(|r| HistoryRecord {
                    symbol: r.symbol.clone(),
                    conditions_met: r.conditions_met.clone(),
                })
                .collect(),
        }
    }
}
