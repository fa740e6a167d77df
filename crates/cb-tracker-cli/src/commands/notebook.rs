//! Notebook registration

use crate::console::CliConsole;
use anyhow::bail;
use cb_tracker_core::delivery::recovery::ensure_notebook;
use cb_tracker_core::{Clock, HttpLogService, Identity, NotebookInfo, SystemClock, TrackerConfig};

/// Create the collector's record for a notebook; an existing record counts as success
pub async fn register(config: &TrackerConfig, path: &str, activebook: bool) -> anyhow::Result<()> {
    if config.net_id.is_empty() {
        bail!("net_id is required to register a notebook");
    }
    config.validate()?;

    let identity = Identity::new(&config.net_id, &config.course_id);
    let notebook = NotebookInfo::for_opened(path, &identity, activebook, SystemClock.now_utc());
    let service = HttpLogService::new(&config.server_url, config.request_timeout)?;

    let console = CliConsole::new(true);
    console.info(&format!(
        "Registering {} (course {}) with {}",
        notebook.notebook_id, notebook.course_id, config.server_url
    ));
    match ensure_notebook(&service, &notebook).await {
        Ok(()) => {
            console.success(&format!("Notebook {} registered", notebook.name));
            Ok(())
        }
        Err(e) => {
            console.error(&format!("Registration failed: {}", e));
            Err(e.into())
        }
    }
}
