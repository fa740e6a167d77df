//! Engagement tracking state machines
//!
//! Each tracker is a plain synchronous state machine fed with timestamps from
//! the injected [`crate::clock::Clock`]; [`Tracker`] routes host events to them
//! and hands the resulting records to delivery.

pub mod activity;
pub mod cell_session;
pub mod copy_paste;
pub mod events;
pub mod page_session;
pub mod stats;
pub mod tracker;
pub mod window_focus;

pub use activity::{ActivityClock, Attention, AttentionChange};
pub use cell_session::CellSessionTracker;
pub use copy_paste::{CopyPasteMonitor, Notifier, RECORDING_NOTICE, TracingNotifier};
pub use events::{ActivitySignal, CellRef, DocumentRef, TimedEvent, TrackerEvent, Visibility};
pub use page_session::{PageSession, PageSessionTracker};
pub use stats::{EngagementStats, StatsPublisher};
pub use tracker::Tracker;
pub use window_focus::WindowFocusTracker;
