//! Status Payload Models
//!
//! Raw DTOs for the polled status endpoints. The upstream APIs encode
//! numbers and booleans as strings, so each raw payload has an explicit
//! fallible parse step into a typed reading.

use serde::Deserialize;

use crate::error::{NotifierError, Result};

// == Climate Status ==
/// Raw payload of the temperature endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ClimateStatus {
    pub real: String,
    pub avg: String,
    pub alive: String,
}

/// Typed climate reading.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateReading {
    pub real_temp: f64,
    pub avg_temp: f64,
    pub is_alive: bool,
}

impl ClimateStatus {
    /// Parses the string-encoded fields.
    pub fn parse(&self) -> Result<ClimateReading> {
        let real_temp = self.real.parse::<f64>().map_err(|err| {
            NotifierError::Status(format!("climate field 'real': {}", err))
        })?;
        let avg_temp = self.avg.parse::<f64>().map_err(|err| {
            NotifierError::Status(format!("climate field 'avg': {}", err))
        })?;
        let is_alive = parse_flag(&self.alive)
            .ok_or_else(|| {
                NotifierError::Status(format!("climate field 'alive': {:?}", self.alive))
            })?;

        Ok(ClimateReading {
            real_temp,
            avg_temp,
            is_alive,
        })
    }
}

// == Sync Queue Status ==
/// Raw payload of the order-sync daemon endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncQueueStatus {
    pub running: String,
    pub qlen: String,
}

/// Typed sync-queue reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncQueueReading {
    pub is_running: bool,
    pub queue_len: i64,
}

impl SyncQueueStatus {
    /// Parses the string-encoded fields.
    pub fn parse(&self) -> Result<SyncQueueReading> {
        let is_running = match self.running.as_str() {
            "0" => false,
            "1" => true,
            other => {
                return Err(NotifierError::Status(format!(
                    "sync-queue field 'running': {:?}",
                    other
                )))
            }
        };
        let queue_len = self.qlen.parse::<i64>().map_err(|err| {
            NotifierError::Status(format!("sync-queue field 'qlen': {}", err))
        })?;

        Ok(SyncQueueReading {
            is_running,
            queue_len,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" | "True" => Some(true),
        "0" | "false" | "False" => Some(false),
        _ => None,
    }
}
