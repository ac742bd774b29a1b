//! Motion classification - activity recognition from raw inertial streams

mod classifier;

pub use classifier::*;

use serde::{Deserialize, Serialize};

/// Coarse activity classes recognized by the motion classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    /// Device at rest.
    Still,
    /// Pedestrian cadence.
    Walking,
    /// Fast pedestrian cadence.
    Running,
    /// Vehicle vibration signature.
    InVehicle,
    /// Rotation without translation.
    Tilting,
    /// Nothing matched.
    Unknown,
}

/// One analysis window's worth of fused motion state.
///
/// Emitted once per analysis tick and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSnapshot {
    /// Mean linear acceleration magnitude over the magnitude window (m/s²).
    pub acceleration_magnitude: f64,
    /// Mean gyroscope magnitude over the magnitude window (rad/s).
    pub gyroscope_magnitude: f64,
    /// Mean magnetic field magnitude over the magnitude window (µT).
    pub magnetic_field_magnitude: f64,
    /// Gravity-removed acceleration of the newest sample (m/s² per axis).
    pub linear_acceleration: [f64; 3],
    /// Low-pass gravity estimate (m/s² per axis).
    pub gravity: [f64; 3],
    /// Classified activity.
    pub activity: ActivityType,
    /// Classification confidence, 0-1.
    pub confidence: f64,
    /// Cumulative steps since the classifier was created.
    pub step_count: u64,
    /// Step cadence over the recent window (Hz).
    pub step_frequency: f64,
    /// Milliseconds on the accelerometer stream's monotonic clock.
    pub timestamp_ms: u64,
}
