//! CLI command implementations

pub mod config;
pub mod export;
pub mod goal;
pub mod logs;
pub mod notebook;
pub mod replay;
pub mod session;
