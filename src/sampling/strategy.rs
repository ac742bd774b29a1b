// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Sampling-strategy derivation
//!
//! The strategy is a pure function of (power mode, driving context, battery
//! level) with no hidden state. Each power mode contributes a base strategy and
//! the driving context then overrides the location interval and appends its
//! own reason clause.

use serde::{Deserialize, Serialize};

use super::context::DrivingContext;
use super::power::PowerMode;
use crate::sources::SensorKind;

/// Sensor sampling rate requested from upstream producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorRate {
    /// ~5 Hz.
    Low,
    /// ~20 Hz.
    Normal,
    /// ~50 Hz.
    High,
    /// ~100 Hz.
    Maximum,
}

impl SensorRate {
    /// Interval between sensor reads at this rate.
    pub fn interval_ms(&self) -> u64 {
        match self {
            SensorRate::Low => 200,
            SensorRate::Normal => 50,
            SensorRate::High => 20,
            SensorRate::Maximum => 10,
        }
    }
}

/// Payload compression requested from upstream producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionLevel {
    /// No compression.
    None,
    /// Cheap compression.
    Low,
    /// Moderate compression.
    Medium,
    /// Aggressive compression.
    High,
}

/// Sampling configuration fed back to the raw-sample producers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingStrategy {
    /// Interval between location fixes.
    pub location_interval_ms: u64,
    /// Requested tri-axis sensor rate.
    pub sensor_rate: SensorRate,
    /// Sensors that should stay powered.
    pub enabled_sensors: Vec<SensorKind>,
    /// Whether background processing is allowed.
    pub background_processing_allowed: bool,
    /// Requested payload compression.
    pub compression: CompressionLevel,
    /// Human-readable justification (power-mode reason; context reason).
    pub reason: String,
}

/// Derive the strategy for the given power mode, context, and battery level.
///
/// Idempotent: equal inputs always produce an equal strategy.
pub fn strategy_for(
    mode: PowerMode,
    context: DrivingContext,
    battery_level: f64,
) -> SamplingStrategy {
    let mut strategy = base_strategy(mode);

    // Context overrides the location interval within what the battery allows.
    let context_reason = match context {
        DrivingContext::Parked => {
            strategy.location_interval_ms = 30_000;
            "parked, location cadence relaxed"
        }
        DrivingContext::HighwayDriving if battery_level > 50.0 => {
            strategy.location_interval_ms = 2_000;
            "highway driving, steady fixes"
        }
        DrivingContext::HighwayDriving => "highway driving, battery-limited cadence",
        DrivingContext::CityDriving | DrivingContext::StopAndGo if battery_level > 20.0 => {
            strategy.location_interval_ms = 1_000;
            "dense traffic, tight fixes"
        }
        DrivingContext::CityDriving | DrivingContext::StopAndGo => {
            "dense traffic, battery-limited cadence"
        }
        DrivingContext::Unknown => "context unknown, mode defaults",
    };

    strategy.reason = format!("{}; {}", strategy.reason, context_reason);
    strategy
}

fn base_strategy(mode: PowerMode) -> SamplingStrategy {
    match mode {
        PowerMode::Performance => SamplingStrategy {
            location_interval_ms: 1_000,
            sensor_rate: SensorRate::High,
            enabled_sensors: vec![
                SensorKind::Accelerometer,
                SensorKind::Gyroscope,
                SensorKind::Magnetometer,
            ],
            background_processing_allowed: true,
            compression: CompressionLevel::None,
            reason: "performance: charging or healthy battery".to_string(),
        },
        PowerMode::Balanced => SamplingStrategy {
            location_interval_ms: 2_000,
            sensor_rate: SensorRate::Normal,
            enabled_sensors: vec![SensorKind::Accelerometer, SensorKind::Gyroscope],
            background_processing_allowed: true,
            compression: CompressionLevel::Low,
            reason: "balanced: nominal battery and thermals".to_string(),
        },
        PowerMode::BatterySaver => SamplingStrategy {
            location_interval_ms: 5_000,
            sensor_rate: SensorRate::Low,
            enabled_sensors: vec![SensorKind::Accelerometer, SensorKind::Gyroscope],
            background_processing_allowed: false,
            compression: CompressionLevel::Medium,
            reason: "battery saver: low battery, OS power-save, or hot device".to_string(),
        },
        PowerMode::CriticalBattery => SamplingStrategy {
            location_interval_ms: 15_000,
            sensor_rate: SensorRate::Low,
            enabled_sensors: vec![SensorKind::Accelerometer],
            background_processing_allowed: false,
            compression: CompressionLevel::High,
            reason: "critical battery: minimal sensing only".to_string(),
        },
        PowerMode::DeepSleep => SamplingStrategy {
            location_interval_ms: 30_000,
            sensor_rate: SensorRate::Low,
            enabled_sensors: vec![SensorKind::Accelerometer],
            background_processing_allowed: false,
            compression: CompressionLevel::High,
            reason: "deep sleep: vehicle parked".to_string(),
        },
    }
}
