//! Dashboard read path

use crate::console::CliConsole;
use anyhow::bail;
use cb_tracker_core::{HttpLogService, LogInfo, LogRecord, RemoteLogService, TrackerConfig};
use std::collections::BTreeMap;

/// Fetch and summarize the logs stored for one student in one course
pub async fn fetch(
    config: &TrackerConfig,
    net_id: Option<String>,
    course_id: Option<String>,
    as_json: bool,
) -> anyhow::Result<()> {
    let net_id = net_id.unwrap_or_else(|| config.net_id.clone());
    let course_id = course_id.unwrap_or_else(|| config.course_id.clone());
    if net_id.is_empty() || course_id.is_empty() {
        bail!("net_id and course_id are required (flags, config file or CB_TRACKER_* env)");
    }

    let service = HttpLogService::new(&config.server_url, config.request_timeout)?;
    let logs = service.fetch_logs(&net_id, &course_id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
        return Ok(());
    }

    let console = CliConsole::new(true);
    console.print_header(&format!("Logs for {} in {}", net_id, course_id));
    if logs.is_empty() {
        console.warn("No logs stored");
        return Ok(());
    }

    for (kind, summary) in summarize(&logs) {
        console.field(kind, format!("{} logs, {}s", summary.count, summary.seconds));
    }

    console.print_header("Time per notebook");
    for (notebook, seconds) in notebook_totals(&logs) {
        console.field(&notebook, format!("{}s", seconds));
    }
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct KindSummary {
    count: usize,
    seconds: u64,
}

fn summarize(logs: &[LogRecord]) -> BTreeMap<&'static str, KindSummary> {
    let mut out: BTreeMap<&'static str, KindSummary> = BTreeMap::new();
    for record in logs {
        let entry = out.entry(record.info.kind()).or_default();
        entry.count += 1;
        entry.seconds += duration_of(&record.info);
    }
    out
}

fn notebook_totals(logs: &[LogRecord]) -> BTreeMap<String, u64> {
    let mut out = BTreeMap::new();
    for record in logs {
        if let LogInfo::Notebook {
            notebook_id,
            duration,
        } = &record.info
        {
            *out.entry(notebook_id.clone()).or_insert(0) += duration;
        }
    }
    out
}

fn duration_of(info: &LogInfo) -> u64 {
    match info {
        LogInfo::Window { duration }
        | LogInfo::Notebook { duration, .. }
        | LogInfo::Cell { duration, .. } => *duration,
        LogInfo::CopyPaste { .. } => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_tracker_core::UploadMode;

    fn record(info: LogInfo) -> LogRecord {
        LogRecord::new("s1", "CS101", info, UploadMode::Batched)
    }

    #[test]
    fn test_summaries_by_kind_and_notebook() {
        let logs = vec![
            record(LogInfo::Notebook {
                notebook_id: "a.ipynb".into(),
                duration: 30,
            }),
            record(LogInfo::Notebook {
                notebook_id: "a.ipynb".into(),
                duration: 12,
            }),
            record(LogInfo::Cell {
                notebook_id: "a.ipynb".into(),
                cell_id: "c1".into(),
                duration: 5,
            }),
            record(LogInfo::Window { duration: 40 }),
            record(LogInfo::CopyPaste {
                notebook_id: "a.ipynb".into(),
                cell_id: None,
                pasted_content: "x".into(),
            }),
        ];

        let by_kind = summarize(&logs);
        assert_eq!(by_kind["notebook"], KindSummary { count: 2, seconds: 42 });
        assert_eq!(by_kind["copy_paste"], KindSummary { count: 1, seconds: 0 });
        assert_eq!(notebook_totals(&logs)["a.ipynb"], 42);
    }
}
