//! Manual save and export of a session's documents

use super::session::{OfflineCollector, replay_file};
use crate::args::ExportKind;
use crate::console::CliConsole;
use anyhow::bail;
use cb_tracker_core::export::{COPY_PASTE_FILE, LOGS_FILE, READABLE_LOGS_FILE};
use cb_tracker_core::{
    Clock, ContentSink, DirectorySink, Exporter, JupyterContentsSink, StoreSnapshot,
    SystemClock, TrackerConfig,
};
use std::path::Path;
use std::sync::Arc;

/// Replay a recording offline, then write the requested documents
pub async fn run(
    config: &TrackerConfig,
    events: &Path,
    kind: ExportKind,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let sink = destination(config, out)?;
    let (session, _) =
        replay_file(config, events, Some(Arc::new(OfflineCollector::default()))).await?;
    let snapshot = session.tracker.snapshot();

    let console = CliConsole::new(true);
    console.print_header("Export");
    let failures = save(&Exporter::new(sink), &snapshot, kind, &console).await;

    if kind == ExportKind::CopyPaste || kind == ExportKind::All {
        println!();
        print!("{}", session.tracker.copy_paste_summary());
    }

    if failures > 0 {
        bail!("{} document(s) could not be saved", failures);
    }
    Ok(())
}

fn destination(config: &TrackerConfig, out: Option<&Path>) -> anyhow::Result<Arc<dyn ContentSink>> {
    if let Some(dir) = out {
        return Ok(Arc::new(DirectorySink::new(dir)));
    }
    match &config.contents_url {
        Some(url) => Ok(Arc::new(JupyterContentsSink::new(
            url,
            config.contents_token.clone(),
            config.request_timeout,
        )?)),
        None => bail!("no destination: pass --out or configure contents_url"),
    }
}

/// Write each selected document, reporting every outcome; returns the failure count
async fn save(
    exporter: &Exporter,
    snapshot: &StoreSnapshot,
    kind: ExportKind,
    console: &CliConsole,
) -> usize {
    let now_ms = SystemClock.now_ms();
    let mut failures = 0;

    let wanted = |k: ExportKind| kind == k || kind == ExportKind::All;
    if wanted(ExportKind::Logs) {
        let result = exporter.save_logs(snapshot, now_ms).await;
        failures += report(console, LOGS_FILE, result);
    }
    if wanted(ExportKind::Readable) {
        let result = exporter.save_readable(snapshot, now_ms).await;
        failures += report(console, READABLE_LOGS_FILE, result);
    }
    if wanted(ExportKind::CopyPaste) {
        let result = exporter.save_copy_paste(snapshot, now_ms).await;
        failures += report(console, COPY_PASTE_FILE, result);
    }
    failures
}

fn report(console: &CliConsole, file: &str, result: cb_tracker_core::TrackerResult<()>) -> usize {
    match result {
        Ok(()) => {
            console.success(&format!("Saved {}", file));
            0
        }
        Err(e) => {
            console.error(&format!("Failed to save {}: {}", file, e));
            1
        }
    }
}
