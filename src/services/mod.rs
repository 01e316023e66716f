//! Service layer for business logic
//!
//! Shared between the HTTP API and the CLI reports.

mod ingestion;
mod metrics_service;
pub mod realtime;

pub use ingestion::*;
pub use metrics_service::*;
pub use realtime::{RealtimePublisher, SnapshotSource};
