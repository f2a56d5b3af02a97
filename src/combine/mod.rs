// src/combine/mod.rs

use std::{
    collections::{HashMap, HashSet},
    fmt,
    str::FromStr,
};

use crate::error::InputError;
use crate::types::{CombinedRow, CombinedTable, FetchedCondition};

pub mod window;

pub use window::intersect_over_history;

/// Minimum number of appearances when none is given.
pub const DEFAULT_THRESHOLD: usize = 2;

/// The combination requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Intersect,
    Union,
    All,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Intersect => "intersect",
            Operation::Union => "union",
            Operation::All => "all",
        }
    }
}

impl FromStr for Operation {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "intersect" => Ok(Operation::Intersect),
            "union" => Ok(Operation::Union),
            "all" => Ok(Operation::All),
            _ => Err(InputError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicate by symbol across every condition, keeping the first-seen row.
///
/// `appearances` counts conditions, so a symbol listed twice by one condition
/// still counts once. `conditions_met` follows fetch order without repeats.
pub fn union(results: &[FetchedCondition]) -> CombinedTable {
    let mut rows: Vec<CombinedRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for fetched in results {
        let name = &fetched.filter.name;
        let mut seen_here: HashSet<String> = HashSet::new();

        for row in &fetched.rows {
            let Some((column, symbol)) = row.symbol_entry() else {
                continue;
            };
            if !seen_here.insert(symbol.clone()) {
                continue;
            }
            match index.get(&symbol) {
                Some(&i) => {
                    let combined = &mut rows[i];
                    combined.appearances += 1;
                    if !combined.conditions_met.contains(name) {
                        combined.conditions_met.push(name.clone());
                    }
                }
                None => {
                    index.insert(symbol.clone(), rows.len());
                    rows.push(CombinedRow {
                        symbol,
                        symbol_column: Some(column),
                        row: row.clone(),
                        appearances: 1,
                        conditions_met: vec![name.clone()],
                    });
                }
            }
        }
    }

    CombinedTable { rows }
}

/// Same rows as [`union`]. This is the table written to history on every run.
pub fn all(results: &[FetchedCondition]) -> CombinedTable {
    union(results)
}

/// Symbols found by at least `threshold` conditions, most frequent first.
pub fn intersect(results: &[FetchedCondition], threshold: usize) -> CombinedTable {
    let mut table = union(results);
    retain_frequent(&mut table, threshold);
    table
}

/// Drop rows below `threshold`, then order by appearances descending. The
/// sort is stable, so ties keep first-occurrence order.
pub(crate) fn retain_frequent(table: &mut CombinedTable, threshold: usize) {
    table.rows.retain(|r| r.appearances >= threshold);
    table
        .rows
        .sort_by(|a, b| b.appearances.cmp(&a.appearances));
}
