//! Session replay command

use super::session::{OfflineCollector, replay_file};
use crate::console::CliConsole;
use cb_tracker_core::TrackerConfig;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// Replay a recording and report what the tracker measured and delivered
pub async fn run(
    config: &TrackerConfig,
    events: &Path,
    dry_run: bool,
    as_json: bool,
) -> anyhow::Result<()> {
    let offline = dry_run.then(|| Arc::new(OfflineCollector::default()));
    let (session, handled) = replay_file(config, events, offline.clone()).await?;

    let tracker = &session.tracker;
    let engagement = tracker.stats();
    let delivery = tracker.delivery().stats();
    let snapshot = tracker.snapshot();

    if as_json {
        let report = json!({
            "session_id": tracker.session_id().to_string(),
            "events": handled,
            "engagement": engagement,
            "delivery": delivery,
            "pending": tracker.delivery().pending(),
            "snapshot": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let console = CliConsole::new(true);
    console.print_header("Session Replay");
    console.info(&format!("Recording: {}", events.display()));
    if dry_run {
        console.info("Dry run: logs kept local");
    } else {
        console.info(&format!("Collector: {}", config.server_url));
    }
    console.field("Session", tracker.session_id());
    console.field("Events", handled);

    console.print_header("Engagement");
    console.field("Page visits", engagement.page_visit_count);
    console.field("Cell visits", snapshot.cell_visits.len());
    console.field("Window switches", engagement.focus_loss_count);
    console.field(
        "Window active",
        format!("{:.1}s", engagement.window_active_ms as f64 / 1000.0),
    );
    console.field("Clipboard events", engagement.copy_paste_count);

    console.print_header("Delivery");
    console.field("Delivered", delivery.delivered);
    console.field("Sent individually", delivery.individual_sent);
    console.field("Batches sent", delivery.batches_sent);
    console.field("Requeued", delivery.requeued);
    console.field("Dropped", delivery.dropped);
    console.field("Notebooks created", delivery.parents_created);

    let pending = tracker.delivery().pending();
    if pending > 0 {
        console.warn(&format!("{} logs still queued (collector unreachable?)", pending));
    } else if delivery.dropped > 0 {
        console.warn(&format!("{} logs were dropped", delivery.dropped));
    } else {
        console.success("All logs delivered");
    }

    if let Some(collector) = offline {
        console.print_separator();
        console.info(&format!("{} logs recorded locally", collector.logs().len()));
    }

    if engagement.copy_paste_count > 0 {
        println!();
        print!("{}", tracker.copy_paste_summary());
    }
    Ok(())
}
