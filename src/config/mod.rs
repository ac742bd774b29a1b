// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Configuration module
//!
//! Every detector threshold is injected through here, so jurisdictions with
//! different road calibrations describe themselves in a TOML file instead of
//! a code change. Defaults are the Kenyan-road calibration.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::detection::SpeedingTable;

/// Main configuration for the analytics core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Buffered values per event-bus channel.
    pub bus_capacity: usize,

    /// Motion classifier tuning.
    pub motion: MotionConfig,

    /// Driving event detector tuning.
    pub detection: DetectionConfig,

    /// Adaptive sampling controller tuning.
    pub sampling: SamplingConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            motion: MotionConfig::default(),
            detection: DetectionConfig::default(),
            sampling: SamplingConfig::default(),
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TelemetryConfig = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Default configuration path relative to a data directory.
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("tripsight.toml")
    }
}

/// Motion classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Analysis cadence.
    pub analysis_interval_ms: u64,

    /// Bound on each typed sample buffer.
    pub buffer_capacity: usize,

    /// Samples fed into each buffer's mean-magnitude computation. Fixed at
    /// the source's historical window regardless of buffer size.
    pub magnitude_window: usize,

    /// Low-pass coefficient for the gravity estimate.
    pub gravity_alpha: f64,

    /// Still: linear acceleration magnitude must sit below this (m/s²).
    pub still_accel_max: f64,

    /// Still: gyroscope magnitude must sit below this (rad/s).
    pub still_gyro_max: f64,

    /// InVehicle: acceleration magnitude must sit above this (m/s²).
    pub vehicle_accel_min: f64,

    /// InVehicle: gyroscope magnitude must sit above this (rad/s).
    pub vehicle_gyro_min: f64,

    /// Walking: minimum step cadence (Hz).
    pub walking_min_hz: f64,

    /// Running: minimum step cadence (Hz).
    pub running_min_hz: f64,

    /// Tilting: minimum gyroscope magnitude for the fallback (rad/s).
    pub tilting_gyro_min: f64,

    /// Linear-acceleration magnitude that counts as a step peak (m/s²).
    pub step_peak_threshold: f64,

    /// Shortest plausible interval between steps.
    pub step_min_interval_ms: u64,

    /// Window for step-cadence estimation.
    pub step_window_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            analysis_interval_ms: 2_000,
            buffer_capacity: 100,
            magnitude_window: 10,
            gravity_alpha: 0.1,
            still_accel_max: 0.5,
            still_gyro_max: 0.1,
            vehicle_accel_min: 15.0,
            vehicle_gyro_min: 5.0,
            walking_min_hz: 0.5,
            running_min_hz: 2.5,
            tilting_gyro_min: 0.3,
            step_peak_threshold: 1.6,
            step_min_interval_ms: 250,
            step_window_ms: 10_000,
        }
    }
}

/// Driving event detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Per-tick detector cadence.
    pub tick_interval_ms: u64,

    /// Positive-behavior detector cadence.
    pub positive_interval_ms: u64,

    /// Analysis window read by the per-tick detectors.
    pub analysis_window_ms: u64,

    /// Pattern window read by phone usage and the behavior detectors.
    pub pattern_window_ms: u64,

    /// Minimum buffered samples before a detector evaluates.
    pub min_samples: usize,

    /// Bound on the trip's snapshot and speed buffers.
    pub buffer_capacity: usize,

    /// Speed below which the vehicle counts as idle (m/s).
    pub movement_threshold_mps: f64,

    /// Braking trigger: rates below this emit an event (m/s²).
    pub braking_trigger_mps2: f64,

    /// Braking High tier boundary (m/s²).
    pub braking_high_mps2: f64,

    /// Braking Critical tier boundary (m/s²).
    pub braking_critical_mps2: f64,

    /// Acceleration trigger: rates above this emit an event (m/s²).
    pub acceleration_trigger_mps2: f64,

    /// Acceleration High tier boundary (m/s²).
    pub acceleration_high_mps2: f64,

    /// Acceleration Critical tier boundary (m/s²).
    pub acceleration_critical_mps2: f64,

    /// Cornering trigger on approximated lateral acceleration (m/s²).
    pub cornering_trigger_mps2: f64,

    /// Cornering High tier boundary (m/s²).
    pub cornering_high_mps2: f64,

    /// Cornering Critical tier boundary (m/s²).
    pub cornering_critical_mps2: f64,

    /// Harsh events in the pattern window before aggressive driving fires.
    pub aggressive_min_events: usize,

    /// Confidence attached to aggressive-driving events.
    pub aggressive_confidence: f64,

    /// Smooth driving: minimum window average speed (km/h).
    pub smooth_min_avg_kmh: f64,

    /// Eco band lower bound (m/s²).
    pub eco_band_low_mps2: f64,

    /// Eco band upper bound (m/s²).
    pub eco_band_high_mps2: f64,

    /// Share of window samples that must sit in the eco band.
    pub eco_min_fraction: f64,

    /// Per-road-type speeding excess tables.
    pub speeding: SpeedingTable,

    /// Phone usage fusion tuning.
    pub phone: PhoneUsageConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            positive_interval_ms: 30_000,
            analysis_window_ms: 3_000,
            pattern_window_ms: 30_000,
            min_samples: 5,
            buffer_capacity: 100,
            movement_threshold_mps: 0.5,
            braking_trigger_mps2: -5.5,
            braking_high_mps2: -6.0,
            braking_critical_mps2: -8.0,
            acceleration_trigger_mps2: 4.5,
            acceleration_high_mps2: 5.0,
            acceleration_critical_mps2: 6.0,
            cornering_trigger_mps2: 5.5,
            cornering_high_mps2: 6.0,
            cornering_critical_mps2: 8.0,
            aggressive_min_events: 3,
            aggressive_confidence: 0.8,
            smooth_min_avg_kmh: 5.0,
            eco_band_low_mps2: 0.5,
            eco_band_high_mps2: 2.0,
            eco_min_fraction: 0.8,
            speeding: SpeedingTable::default(),
            phone: PhoneUsageConfig::default(),
        }
    }
}

/// Phone usage fusion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneUsageConfig {
    /// Weight of the hand-movement factor.
    pub hand_movement_weight: f64,

    /// Weight of the driving-disruption factor.
    pub driving_disruption_weight: f64,

    /// Weight of the orientation-change factor.
    pub orientation_change_weight: f64,

    /// Weight of the audio-periodicity proxy factor.
    pub audio_periodicity_weight: f64,

    /// Weight of the speed-correlation factor.
    pub speed_correlation_weight: f64,

    /// Hand-movement band lower bound (m/s²).
    pub hand_band_low_mps2: f64,

    /// Hand-movement band upper bound (m/s²).
    pub hand_band_high_mps2: f64,

    /// Gyroscope magnitude that counts as an orientation spike (rad/s).
    pub orientation_spike_rad_s: f64,

    /// Speed delta below which disruption reversals are noise (m/s).
    pub disruption_delta_mps: f64,

    /// Acceleration magnitude that counts as a periodicity peak (m/s²).
    pub periodicity_peak_mps2: f64,

    /// Fused probability must exceed this to emit an event.
    pub emit_threshold: f64,

    /// Medium severity boundary.
    pub medium_threshold: f64,

    /// High severity boundary.
    pub high_threshold: f64,

    /// Critical severity boundary.
    pub critical_threshold: f64,
}

impl Default for PhoneUsageConfig {
    fn default() -> Self {
        Self {
            hand_movement_weight: 0.25,
            driving_disruption_weight: 0.30,
            orientation_change_weight: 0.20,
            audio_periodicity_weight: 0.15,
            speed_correlation_weight: 0.10,
            hand_band_low_mps2: 0.8,
            hand_band_high_mps2: 3.0,
            orientation_spike_rad_s: 1.5,
            disruption_delta_mps: 0.5,
            periodicity_peak_mps2: 1.0,
            emit_threshold: 0.8,
            medium_threshold: 0.85,
            high_threshold: 0.90,
            critical_threshold: 0.95,
        }
    }
}

/// Adaptive sampling controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Bound on the controller's own speed-history buffer.
    pub speed_history_capacity: usize,

    /// Rolling window for context classification.
    pub context_window_ms: u64,

    /// Speed above which the vehicle counts as moving (m/s).
    pub movement_threshold_mps: f64,

    /// Stillness required before the context parks.
    pub parked_after_ms: u64,

    /// Moving samples required across the window to leave Parked.
    pub unpark_min_samples: usize,

    /// Highway: minimum window mean speed (m/s).
    pub highway_min_mps: f64,

    /// Highway: maximum window speed variance.
    pub highway_max_variance: f64,

    /// Stop-and-go: minimum window mean speed (km/h).
    pub stop_and_go_min_kmh: f64,

    /// Stop-and-go: minimum window speed variance.
    pub stop_and_go_min_variance: f64,

    /// City: minimum window mean speed (km/h), exclusive.
    pub city_min_kmh: f64,

    /// City: maximum window mean speed (km/h), inclusive.
    pub city_max_kmh: f64,

    /// Strategy recompute cadence.
    pub recompute_interval_ms: u64,

    /// Battery monitor cadence.
    pub monitor_interval_ms: u64,

    /// Battery drop that triggers an out-of-cycle recompute (percent).
    pub battery_drop_trigger_percent: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            speed_history_capacity: 120,
            context_window_ms: 60_000,
            movement_threshold_mps: 0.5,
            parked_after_ms: 120_000,
            unpark_min_samples: 3,
            highway_min_mps: 22.2,
            highway_max_variance: 5.0,
            stop_and_go_min_kmh: 5.0,
            stop_and_go_min_variance: 10.0,
            city_min_kmh: 2.0,
            city_max_kmh: 50.0,
            recompute_interval_ms: 5_000,
            monitor_interval_ms: 30_000,
            battery_drop_trigger_percent: 5.0,
        }
    }
}
