//! Daily study goal, stored per calendar day
//!
//! A UI preference kept in a small JSON file; it has no part in delivery.

use crate::error::{TrackerError, TrackerResult};
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct GoalStore {
    path: PathBuf,
}

impl GoalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> TrackerResult<BTreeMap<String, u32>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| TrackerError::io_at(e.to_string(), self.path.display().to_string()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Goal in minutes for `date`
    pub fn get(&self, date: NaiveDate) -> TrackerResult<Option<u32>> {
        Ok(self.load()?.get(&date.format(DATE_FORMAT).to_string()).copied())
    }

    pub fn set(&self, date: NaiveDate, minutes: u32) -> TrackerResult<()> {
        let mut goals = self.load()?;
        goals.insert(date.format(DATE_FORMAT).to_string(), minutes);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TrackerError::io_at(e.to_string(), parent.display().to_string()))?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&goals)?)
            .map_err(|e| TrackerError::io_at(e.to_string(), self.path.display().to_string()))?;
        debug!(path = %self.path.display(), date = %date, minutes, "goal saved");
        Ok(())
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(text: &str) -> TrackerResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| TrackerError::invalid_input(format!("Invalid date '{}': {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = GoalStore::new(dir.path().join("nested").join("goals.json"));
        let day = parse_date("2026-03-14").unwrap();

        assert_eq!(store.get(day).unwrap(), None);
        store.set(day, 45).unwrap();
        store.set(parse_date("2026-03-15").unwrap(), 30).unwrap();
        assert_eq!(store.get(day).unwrap(), Some(45));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"2026-03-14\": 45"));
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(matches!(
            parse_date("14/03/2026"),
            Err(TrackerError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goals.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(GoalStore::new(path).get(GoalStore::today()).is_err());
    }
}
