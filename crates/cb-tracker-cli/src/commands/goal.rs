//! Daily goal commands

use crate::console::CliConsole;
use cb_tracker_core::goals::parse_date;
use cb_tracker_core::{GoalStore, TrackerConfig};
use chrono::NaiveDate;

fn day(date: Option<&str>) -> anyhow::Result<NaiveDate> {
    Ok(match date {
        Some(text) => parse_date(text)?,
        None => GoalStore::today(),
    })
}

pub fn get(config: &TrackerConfig, date: Option<&str>) -> anyhow::Result<()> {
    let day = day(date)?;
    let store = GoalStore::new(config.goals_file());
    let console = CliConsole::new(true);
    match store.get(day)? {
        Some(minutes) => console.success(&format!("Goal for {}: {} minutes", day, minutes)),
        None => console.warn(&format!("No goal set for {}", day)),
    }
    Ok(())
}

pub fn set(config: &TrackerConfig, minutes: u32, date: Option<&str>) -> anyhow::Result<()> {
    let day = day(date)?;
    let store = GoalStore::new(config.goals_file());
    store.set(day, minutes)?;
    CliConsole::new(true).success(&format!(
        "Goal for {} set to {} minutes ({})",
        day,
        minutes,
        store.path().display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_uses_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TrackerConfig::default();
        config.goals_path = Some(dir.path().join("goals.json"));

        set(&config, 40, Some("2026-10-16")).unwrap();
        get(&config, Some("2026-10-16")).unwrap();

        let stored = GoalStore::new(config.goals_file())
            .get(parse_date("2026-10-16").unwrap())
            .unwrap();
        assert_eq!(stored, Some(40));
    }

    #[test]
    fn test_bad_date() {
        assert!(day(Some("16.10.2026")).is_err());
        assert!(day(None).is_ok());
    }
}
