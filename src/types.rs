// src/types.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Columns the screener uses for the ticker, in lookup order.
pub const SYMBOL_KEYS: &[&str] = &["nsecode", "symbol"];

/// A single named screening condition as loaded from the input file.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct FilterDefinition {
    pub name: String,
    pub expression: String,
}

impl FilterDefinition {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }

    /// Default label for the `position`-th (1-based) condition.
    pub fn positional_name(position: usize) -> String {
        format!("condition_{}", position)
    }
}

/// One record of a screener response: column name → scalar value.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(transparent)]
pub struct ResultRow(pub Map<String, Value>);

impl ResultRow {
    /// The ticker and the column it was read from.
    pub fn symbol_entry(&self) -> Option<(&'static str, String)> {
        SYMBOL_KEYS.iter().find_map(|&key| {
            let value = self.0.get(key)?;
            let symbol = match value {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            (!symbol.is_empty()).then_some((key, symbol))
        })
    }

    pub fn symbol(&self) -> Option<String> {
        self.symbol_entry().map(|(_, s)| s)
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Render a column as a CSV cell; missing and null values are empty.
    pub fn cell(&self, column: &str) -> String {
        match self.0.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

impl From<Map<String, Value>> for ResultRow {
    fn from(map: Map<String, Value>) -> Self {
        ResultRow(map)
    }
}

/// The rows one condition produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedCondition {
    pub filter: FilterDefinition,
    pub rows: Vec<ResultRow>,
}

/// A combined result: the first-seen row for a symbol plus its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
    pub symbol: String,
    /// Column the symbol came from, if any. Not repeated in reports.
    pub symbol_column: Option<&'static str>,
    pub row: ResultRow,
    pub appearances: usize,
    pub conditions_met: Vec<String>,
}

impl CombinedRow {
    pub fn conditions_joined(&self) -> String {
        self.conditions_met.join("; ")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedTable {
    pub rows: Vec<CombinedRow>,
}

impl CombinedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.symbol.as_str()).collect()
    }

    pub fn get(&self, symbol: &str) -> Option<&CombinedRow> {
        self.rows.iter().find(|r| r.symbol == symbol)
    }
}
