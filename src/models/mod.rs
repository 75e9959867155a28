//! Models Module
//!
//! Pure-data DTOs for the payloads returned by the polled status APIs.

mod report;
mod status;

pub use report::{ColumnHeader, DashboardCounter, DetailReport};
pub use status::{ClimateReading, ClimateStatus, SyncQueueReading, SyncQueueStatus};
