//! CodeBench engagement tracker
//!
//! Measures time on documents, cells and the focused window plus clipboard
//! activity, and ships the measurements to the CodeBench collector through a
//! hybrid immediate/batched delivery pipeline with missing-parent recovery.

pub mod clock;
pub mod config;
pub mod content;
pub mod delivery;
pub mod error;
pub mod export;
pub mod goals;
pub mod model;
pub mod remote;
pub mod store;
pub mod tracking;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TrackerConfig;
pub use delivery::{DeliveryStatsSnapshot, LogManager};
pub use error::{CollectorErrorCode, TrackerError, TrackerResult};
pub use export::{ContentSink, CopyPasteSummary, DirectorySink, Exporter, JupyterContentsSink};
pub use goals::GoalStore;
pub use model::{Identity, LogInfo, LogRecord, NotebookInfo, UploadMode};
pub use remote::{HttpLogService, RemoteLogService};
pub use store::{LogStore, StoreSnapshot};
pub use tracking::{TimedEvent, Tracker, TrackerEvent};
