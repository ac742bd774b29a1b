// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Source capability traits and raw sample types
//!
//! The core never touches a platform sensor/location/power API. Collaborators
//! implement these traits and push samples in; the core pushes
//! [`SamplingStrategy`](crate::sampling::SamplingStrategy) updates back out
//! so producers can throttle themselves.

use anyhow::Result;
use async_trait::async_trait;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::sampling::SamplingStrategy;

/// Tri-axis sensor kinds the core consumes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SensorKind {
    /// MEMS accelerometer (m/s² per axis).
    Accelerometer,
    /// Gyroscope (rad/s per axis).
    Gyroscope,
    /// Magnetometer (µT per axis).
    Magnetometer,
}

/// One raw tri-axis sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSensorSample {
    /// Which sensor produced this sample.
    pub kind: SensorKind,
    /// Milliseconds on the stream's monotonic clock.
    pub timestamp_ms: u64,
    /// X axis component.
    pub x: f64,
    /// Y axis component.
    pub y: f64,
    /// Z axis component.
    pub z: f64,
}

impl RawSensorSample {
    /// Build a sample from axis components.
    pub fn new(kind: SensorKind, timestamp_ms: u64, x: f64, y: f64, z: f64) -> Self {
        Self {
            kind,
            timestamp_ms,
            x,
            y,
            z,
        }
    }

    /// Axis components as a vector.
    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Euclidean norm of the axis triple.
    pub fn magnitude(&self) -> f64 {
        self.as_vector().norm()
    }

    /// True when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One GPS/GNSS fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
    /// Meters above the ellipsoid.
    pub altitude: f64,
    /// Ground speed in m/s, when the fix carries one.
    pub speed_mps: Option<f64>,
    /// Horizontal accuracy radius in meters.
    pub accuracy_m: f64,
    /// Course over ground in degrees.
    pub bearing_deg: f64,
    /// Milliseconds on the stream's monotonic clock.
    pub timestamp_ms: u64,
}

impl LocationSample {
    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_m(&self, other: &LocationSample) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// True when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
            && self.accuracy_m.is_finite()
            && self.bearing_deg.is_finite()
            && self.speed_mps.map(|s| s.is_finite()).unwrap_or(true)
    }
}

/// Device thermal status as reported by the OS.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ThermalState {
    /// Nominal operating temperature.
    Normal,
    /// Elevated but acceptable.
    Warm,
    /// Throttling likely.
    Hot,
    /// Emergency throttling.
    Critical,
}

/// Raw power telemetry as supplied by the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerTelemetry {
    /// Battery charge, 0-100.
    pub battery_level: f64,
    /// True while on external power.
    pub is_charging: bool,
    /// True while the OS power-save mode is active.
    pub is_power_save_mode: bool,
    /// Thermal status.
    pub thermal_state: ThermalState,
    /// Milliseconds on the stream's monotonic clock.
    pub timestamp_ms: u64,
}

/// Per-source health bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceHealth {
    /// Samples successfully read.
    pub readings_count: u64,
    /// Read failures.
    pub error_count: u64,
    /// Most recent failure, if any.
    pub last_error: Option<String>,
}

/// A producer of raw tri-axis sensor samples.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Unique identifier for this source.
    fn id(&self) -> &str;

    /// Read the batch of samples produced since the last call.
    async fn read(&mut self) -> Result<Vec<RawSensorSample>>;

    /// Apply a sampling-strategy update pushed back from the core.
    fn apply_strategy(&mut self, strategy: &SamplingStrategy);

    /// Source self-description for diagnostics.
    fn describe(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// A producer of location fixes.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Unique identifier for this source.
    fn id(&self) -> &str;

    /// Read the next fix, or `None` when no new fix is available.
    async fn read(&mut self) -> Result<Option<LocationSample>>;

    /// Apply a sampling-strategy update pushed back from the core.
    fn apply_strategy(&mut self, strategy: &SamplingStrategy);
}

/// A provider of device power telemetry.
#[async_trait]
pub trait PowerSource: Send + Sync {
    /// Read the current power telemetry.
    async fn read(&self) -> Result<PowerTelemetry>;
}
