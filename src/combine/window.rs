// src/combine/window.rs

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

use super::retain_frequent;
use crate::config::RETENTION_DAYS;
use crate::history::HistoryEntry;
use crate::types::{CombinedRow, CombinedTable, ResultRow};

/// Intersect across days instead of conditions.
///
/// A symbol's `appearances` is the number of distinct dates in `entries` on
/// which it was part of an "all" result. Only the last `RETENTION_DAYS` dates
/// up to and including `today` count, so `appearances` never exceeds that.
/// Older entries the store still keeps are ignored. Provenance labels read
/// `"<condition> (<DD Mon>)"`. Columns come from `current` when the symbol is
/// in today's run; otherwise only the symbol is known.
pub fn intersect_over_history(
    entries: &[HistoryEntry],
    current: &CombinedTable,
    threshold: usize,
    today: NaiveDate,
) -> CombinedTable {
    let mut ordered: Vec<&HistoryEntry> = entries
        .iter()
        .filter(|e| today.signed_duration_since(e.date).num_days() < RETENTION_DAYS)
        .collect();
    ordered.sort_by_key(|e| e.timestamp);

    let mut rows: Vec<CombinedRow> = Vec::new();
    let mut dates: Vec<BTreeSet<NaiveDate>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in ordered {
        let day = entry.date.format("%d %b").to_string();
        for record in &entry.records {
            let i = *index.entry(record.symbol.as_str()).or_insert_with(|| {
                let (symbol_column, row) = match current.get(&record.symbol) {
                    Some(c) => (c.symbol_column, c.row.clone()),
                    None => (None, ResultRow::default()),
                };
                rows.push(CombinedRow {
                    symbol: record.symbol.clone(),
                    symbol_column,
                    row,
                    appearances: 0,
                    conditions_met: Vec::new(),
                });
                dates.push(BTreeSet::new());
                rows.len() - 1
            });

            dates[i].insert(entry.date);
            for condition in &record.conditions_met {
                let label = format!("{} ({})", condition, day);
                if !rows[i].conditions_met.contains(&label) {
                    rows[i].conditions_met.push(label);
                }
            }
        }
    }

    for (row, days) in rows.iter_mut().zip(&dates) {
        row.appearances = days.len();
    }

    let mut table = CombinedTable { rows };
    retain_frequent(&mut table, threshold);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::{self, tests::fetched};
    use crate::history::HistoryRecord;
    use chrono::{FixedOffset, TimeZone};

    fn oct(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn entry(y: i32, m: u32, d: u32, hour: u32, records: &[(&str, &[&str])]) -> HistoryEntry {
        let ts = FixedOffset::east_opt(19800)
            .unwrap()
            .with_ymd_and_hms(y, m, d, hour, 0, 0)
            .unwrap();
        HistoryEntry {
            date: ts.date_naive(),
            timestamp: ts,
            filename: "scans_all.csv".into(),
            operation: "all".into(),
            records: records
                .iter()
                .map(|(s, conds)| HistoryRecord {
                    symbol: s.to_string(),
                    conditions_met: conds.iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn counts_distinct_days() {
        let entries = vec![
            entry(2026, 10, 14, 10, &[("X", &["A"]), ("Y", &["A"])]),
            entry(2026, 10, 16, 10, &[("X", &["B"])]),
            // same-day rerun must not count twice
            entry(2026, 10, 16, 15, &[("X", &["A", "B"]), ("Z", &["C"])]),
            entry(2026, 10, 18, 10, &[("X", &["A"]), ("Y", &["B"])]),
        ];
        let table = intersect_over_history(&entries, &CombinedTable::default(), 2, oct(18));

        assert_eq!(table.symbols(), vec!["X", "Y"]);
        let x = table.get("X").unwrap();
        assert_eq!(x.appearances, 3);
        assert_eq!(
            x.conditions_met,
            vec!["A (14 Oct)", "B (16 Oct)", "A (16 Oct)", "A (18 Oct)"]
        );
        assert_eq!(table.get("Y").unwrap().conditions_joined(), "A (14 Oct); B (18 Oct)");
    }

    #[test]
    fn entries_are_read_in_time_order() {
        let entries = vec![
            entry(2026, 10, 18, 10, &[("X", &["late"])]),
            entry(2026, 10, 12, 10, &[("X", &["early"])]),
        ];
        let table = intersect_over_history(&entries, &CombinedTable::default(), 1, oct(18));
        assert_eq!(
            table.get("X").unwrap().conditions_met,
            vec!["early (12 Oct)", "late (18 Oct)"]
        );
    }

    #[test]
    fn attributes_come_from_current_run() {
        let current = combine::all(&[fetched("A", &["X"])]);
        let entries = vec![
            entry(2026, 10, 17, 10, &[("X", &["A"]), ("Y", &["A"])]),
            entry(2026, 10, 18, 10, &[("X", &["A"]), ("Y", &["A"])]),
        ];
        let table = intersect_over_history(&entries, &current, 2, oct(18));
        assert_eq!(table.get("X").unwrap().row.cell("name"), "x");
        assert_eq!(table.get("X").unwrap().symbol_column, Some("nsecode"));
        assert!(table.get("Y").unwrap().row.0.is_empty());
    }

    #[test]
    fn empty_history_is_empty_table() {
        assert!(intersect_over_history(&[], &CombinedTable::default(), 1, oct(18)).is_empty());
    }

    #[test]
    fn window_counts_at_most_seven_days() {
        let entries: Vec<_> = (11..=18)
            .map(|d| entry(2026, 10, d, 10, &[("X", &["A"])]))
            .collect();
        let kept = crate::history::prune(entries, oct(18), RETENTION_DAYS);
        assert_eq!(kept.len(), 8);

        let table = intersect_over_history(&kept, &CombinedTable::default(), 1, oct(18));
        let x = table.get("X").unwrap();
        assert_eq!(x.appearances, 7);
        assert_eq!(x.conditions_met.first().map(String::as_str), Some("A (12 Oct)"));
        assert!(intersect_over_history(&kept, &CombinedTable::default(), 8, oct(18)).is_empty());
    }
}
