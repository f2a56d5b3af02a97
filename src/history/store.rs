// src/history/store.rs

use chrono::NaiveDate;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{market_today, HistoryEntry};
use crate::config::RETENTION_DAYS;
use crate::error::HistoryError;

/// The JSON history file: a list of [`HistoryEntry`], oldest first.
///
/// No locking. Two invocations running at once race and the last one to
/// save wins.
pub struct HistoryStore {
    path: PathBuf,
    retention_days: i64,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retention_days: RETENTION_DAYS,
        }
    }

    pub fn with_retention(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents. An absent file is an empty history.
    pub fn read_entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(HistoryError::Corrupt {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
        };
        serde_json::from_str(&text).map_err(|e| HistoryError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Entries inside the retention window as of today.
    pub fn load(&self) -> Vec<HistoryEntry> {
        self.load_as_of(market_today())
    }

    /// Entries inside the retention window as of `today`. Unreadable history
    /// is logged and treated as empty.
    pub fn load_as_of(&self, today: NaiveDate) -> Vec<HistoryEntry> {
        match self.read_entries() {
            Ok(entries) => {
                let kept = prune(entries, today, self.retention_days);
                debug!(path = %self.path.display(), entries = kept.len(), "loaded history");
                kept
            }
            Err(e) => {
                warn!(error = %e, "ignoring history");
                Vec::new()
            }
        }
    }

    /// Append `entry` and rewrite the file. Returns the entries now on disk.
    pub fn append(&self, entry: HistoryEntry) -> Result<Vec<HistoryEntry>, HistoryError> {
        self.append_as_of(entry, market_today())
    }

    pub fn append_as_of(
        &self,
        entry: HistoryEntry,
        today: NaiveDate,
    ) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut entries = self.load_as_of(today);
        entries.push(entry);
        self.save(&entries)?;
        info!(path = %self.path.display(), entries = entries.len(), "saved history");
        Ok(entries)
    }

    /// Serialize fully, write to a sibling temp file, then rename over the
    /// target, so a finished save always leaves valid JSON behind. The temp
    /// file is removed if any step fails.
    fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(entries)?;
        let io_err = |source| HistoryError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(io_err)?;
                parent
            }
            None => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

/// Keep entries dated at most `retention_days` before `today`.
pub fn prune(entries: Vec<HistoryEntry>, today: NaiveDate, retention_days: i64) -> Vec<HistoryEntry> {
    entries
        .into_iter()
        .filter(|e| today.signed_duration_since(e.date).num_days() <= retention_days)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryRecord;
    use chrono::{Days, FixedOffset, TimeZone};
    use tempfile::tempdir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(date: NaiveDate, symbols: &[&str]) -> HistoryEntry {
        let ts = FixedOffset::east_opt(19800)
            .unwrap()
            .from_local_datetime(&date.and_hms_opt(15, 45, 0).unwrap())
            .unwrap();
        HistoryEntry {
            date,
            timestamp: ts,
            filename: "scans_all.csv".into(),
            operation: "all".into(),
            records: symbols
                .iter()
                .map(|s| HistoryRecord {
                    symbol: s.to_string(),
                    conditions_met: vec!["condition_1".into()],
                })
                .collect(),
        }
    }

    #[test]
    fn prune_boundary_is_seven_days() {
        let today = day(2026, 10, 18);
        let entries = vec![
            entry(today - Days::new(8), &["OLD"]),
            entry(today - Days::new(7), &["EDGE"]),
            entry(today, &["NOW"]),
        ];
        let kept = prune(entries, today, RETENTION_DAYS);
        let dates: Vec<_> = kept.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(2026, 10, 11), today]);
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        assert!(store.read_entries().unwrap().is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_is_ignored_and_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();
        let store = HistoryStore::new(&path);

        assert!(matches!(store.read_entries(), Err(HistoryError::Corrupt { .. })));
        let today = day(2026, 10, 18);
        assert!(store.load_as_of(today).is_empty());

        store.append_as_of(entry(today, &["X"]), today).unwrap();
        let reread = store.read_entries().unwrap();
        assert_eq!(reread.len(), 1);
        assert_eq!(reread[0].records[0].symbol, "X");
    }

    #[test]
    fn append_prunes_and_persists() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nested").join("history.json"));
        let today = day(2026, 10, 18);

        store
            .append_as_of(entry(today - Days::new(9), &["OLD"]), today - Days::new(9))
            .unwrap();
        store
            .append_as_of(entry(today - Days::new(2), &["MID"]), today - Days::new(2))
            .unwrap();
        let saved = store.append_as_of(entry(today, &["NEW"]), today).unwrap();

        let symbols: Vec<_> = saved.iter().map(|e| e.records[0].symbol.as_str()).collect();
        assert_eq!(symbols, vec!["MID", "NEW"]);
        assert_eq!(store.read_entries().unwrap(), saved);
        let leftovers = fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn retention_is_configurable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let today = day(2026, 10, 18);
        HistoryStore::new(&path)
            .append_as_of(entry(today - Days::new(3), &["X"]), today)
            .unwrap();
        assert!(HistoryStore::new(&path)
            .with_retention(2)
            .load_as_of(today)
            .is_empty());
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        // a directory in the way makes the final rename fail
        fs::create_dir(&path).unwrap();
        let store = HistoryStore::new(&path);
        let today = day(2026, 10, 18);

        let err = store.append_as_of(entry(today, &["X"]), today).unwrap_err();
        assert!(matches!(err, HistoryError::Io { .. }));

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("history.json")]);
        assert!(path.is_dir());
    }
}
