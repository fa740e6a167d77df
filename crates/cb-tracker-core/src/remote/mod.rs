//! The remote log collector: wire types, the service seam, and its HTTP client

pub mod http;
pub mod service;
pub mod wire;

pub use http::HttpLogService;
pub use service::RemoteLogService;
pub use wire::{ApiReply, BatchRequest, BatchSummary, ItemResult};

#[cfg(test)]
pub use service::MockRemoteLogService;
