//! Core module - engine wiring, event bus, ring buffers

mod buffer;
mod engine;
mod event_bus;

pub use buffer::{SampleBuffer, SampleError, TimestampedSample};
pub use engine::{Engine, EngineSources};
pub use event_bus::EventBus;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// System-wide state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    /// True while the engine's periodic tasks are running.
    pub running: bool,
    /// True while a trip is open in the event detector.
    pub trip_open: bool,
    /// Samples pumped from the sources since start.
    pub total_samples: u64,
    /// Driving events recorded since start.
    pub total_events: u64,
    /// Seconds since the engine was started.
    pub uptime_seconds: u64,
    /// Wall-clock time of the most recent driving event.
    pub last_event: Option<DateTime<Utc>>,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            running: false,
            trip_open: false,
            total_samples: 0,
            total_events: 0,
            uptime_seconds: 0,
            last_event: None,
        }
    }
}
