// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Trip simulator for demo/testing
//!
//! Drives a scripted speed profile through all three source traits so the
//! whole pipeline can run without hardware. One shared core advances a
//! simulated clock; the sensor, location, and power views read from it.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::prelude::*;
use rand_distr::Normal;

use super::{
    LocationSample, LocationSource, PowerSource, PowerTelemetry, RawSensorSample,
    SensorKind, SensorSource, ThermalState,
};
use crate::sampling::SamplingStrategy;

/// Meters of latitude per degree, near the equator.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// One leg of the scripted drive.
#[derive(Debug, Clone, Copy)]
pub struct TripPhase {
    /// Leg duration.
    pub duration_ms: u64,
    /// Speed to ramp toward across the leg.
    pub target_speed_mps: f64,
    /// Yaw rate held across the leg.
    pub turn_rate_rad_s: f64,
}

/// A scripted urban drive: idle, accelerate, cruise, brake hard, corner,
/// and park again.
pub fn urban_drive_script() -> Vec<TripPhase> {
    vec![
        TripPhase { duration_ms: 5_000, target_speed_mps: 0.0, turn_rate_rad_s: 0.0 },
        TripPhase { duration_ms: 10_000, target_speed_mps: 13.9, turn_rate_rad_s: 0.0 },
        TripPhase { duration_ms: 30_000, target_speed_mps: 13.9, turn_rate_rad_s: 0.0 },
        TripPhase { duration_ms: 2_000, target_speed_mps: 0.5, turn_rate_rad_s: 0.0 },
        TripPhase { duration_ms: 8_000, target_speed_mps: 12.0, turn_rate_rad_s: 0.0 },
        TripPhase { duration_ms: 4_000, target_speed_mps: 12.0, turn_rate_rad_s: 0.6 },
        TripPhase { duration_ms: 20_000, target_speed_mps: 13.0, turn_rate_rad_s: 0.0 },
        TripPhase { duration_ms: 5_000, target_speed_mps: 0.0, turn_rate_rad_s: 0.0 },
    ]
}

struct SimCore {
    rng: StdRng,
    time_ms: u64,
    speed_mps: f64,
    heading_rad: f64,
    latitude: f64,
    longitude: f64,
    battery_level: f64,
    charging: bool,
    phases: Vec<TripPhase>,
    phase_index: usize,
    phase_elapsed_ms: u64,
}

impl SimCore {
    fn current_phase(&self) -> TripPhase {
        self.phases
            .get(self.phase_index)
            .copied()
            .unwrap_or(TripPhase {
                duration_ms: u64::MAX,
                target_speed_mps: 0.0,
                turn_rate_rad_s: 0.0,
            })
    }

    /// Advance the simulated clock, integrating speed and position.
    fn advance(&mut self, dt_ms: u64) -> f64 {
        let phase = self.current_phase();
        let dt_s = dt_ms as f64 / 1000.0;

        // Ramp speed linearly toward the phase target.
        let remaining_ms = phase.duration_ms.saturating_sub(self.phase_elapsed_ms).max(1);
        let ramp = (phase.target_speed_mps - self.speed_mps) / (remaining_ms as f64 / 1000.0);
        let longitudinal = ramp.clamp(-9.0, 6.5);
        self.speed_mps = (self.speed_mps + longitudinal * dt_s).max(0.0);

        self.heading_rad += phase.turn_rate_rad_s * dt_s;
        let distance = self.speed_mps * dt_s;
        self.latitude += distance * self.heading_rad.cos() / METERS_PER_DEGREE;
        self.longitude += distance * self.heading_rad.sin() / METERS_PER_DEGREE;

        // Slow linear drain while discharging.
        if !self.charging {
            self.battery_level = (self.battery_level - dt_s * 0.002).max(0.0);
        }

        self.time_ms += dt_ms;
        self.phase_elapsed_ms += dt_ms;
        if self.phase_elapsed_ms >= phase.duration_ms {
            self.phase_index += 1;
            self.phase_elapsed_ms = 0;
        }

        longitudinal
    }

    fn noise(&mut self, sigma: f64) -> f64 {
        self.rng.sample(Normal::new(0.0, sigma).unwrap_or(Normal::new(0.0, 1e-6).unwrap()))
    }
}

/// Shared simulator handle; split into the three source views.
pub struct TripSimulator {
    core: Arc<Mutex<SimCore>>,
}

impl TripSimulator {
    /// Simulator over the default urban drive script.
    pub fn new() -> Self {
        Self::with_script(urban_drive_script())
    }

    /// Simulator over an explicit script.
    pub fn with_script(phases: Vec<TripPhase>) -> Self {
        Self::build(phases, StdRng::from_entropy())
    }

    /// Deterministic simulator for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(urban_drive_script(), StdRng::seed_from_u64(seed))
    }

    fn build(phases: Vec<TripPhase>, rng: StdRng) -> Self {
        Self {
            core: Arc::new(Mutex::new(SimCore {
                rng,
                time_ms: 0,
                speed_mps: 0.0,
                heading_rad: 0.0,
                latitude: -1.2864,
                longitude: 36.8172,
                battery_level: 78.0,
                charging: false,
                phases,
                phase_index: 0,
                phase_elapsed_ms: 0,
            })),
        }
    }

    /// Split into sensor, location, and power views over the same clock.
    pub fn split(
        self,
    ) -> (
        SimulatedSensorSource,
        SimulatedLocationSource,
        SimulatedPowerSource,
    ) {
        let core = self.core;
        (
            SimulatedSensorSource {
                core: core.clone(),
                enabled: vec![
                    SensorKind::Accelerometer,
                    SensorKind::Gyroscope,
                    SensorKind::Magnetometer,
                ],
                sample_interval_ms: 50,
            },
            SimulatedLocationSource { core: core.clone() },
            SimulatedPowerSource { core },
        )
    }
}

impl Default for TripSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sensor view: each read advances the clock one sample interval and yields
/// one sample per enabled sensor.
pub struct SimulatedSensorSource {
    core: Arc<Mutex<SimCore>>,
    enabled: Vec<SensorKind>,
    sample_interval_ms: u64,
}

#[async_trait]
impl SensorSource for SimulatedSensorSource {
    fn id(&self) -> &str {
        "sim-imu"
    }

    async fn read(&mut self) -> Result<Vec<RawSensorSample>> {
        let mut core = self.core.lock();
        let longitudinal = core.advance(self.sample_interval_ms);
        let ts = core.time_ms;
        let phase = core.current_phase();

        let mut samples = Vec::with_capacity(self.enabled.len());
        for kind in &self.enabled {
            let sample = match kind {
                SensorKind::Accelerometer => {
                    // Longitudinal dynamics on X, gravity on Z, road noise on all.
                    RawSensorSample::new(
                        *kind,
                        ts,
                        longitudinal + core.noise(0.15),
                        core.noise(0.15),
                        9.81 + core.noise(0.1),
                    )
                }
                SensorKind::Gyroscope => RawSensorSample::new(
                    *kind,
                    ts,
                    core.noise(0.01),
                    core.noise(0.01),
                    phase.turn_rate_rad_s + core.noise(0.02),
                ),
                SensorKind::Magnetometer => RawSensorSample::new(
                    *kind,
                    ts,
                    22.0 + core.noise(0.3),
                    5.0 + core.noise(0.3),
                    -43.0 + core.noise(0.3),
                ),
            };
            samples.push(sample);
        }
        Ok(samples)
    }

    fn apply_strategy(&mut self, strategy: &SamplingStrategy) {
        self.sample_interval_ms = strategy.sensor_rate.interval_ms();
        if !strategy.enabled_sensors.is_empty() {
            self.enabled = strategy.enabled_sensors.clone();
        }
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": "simulator",
            "enabled": self.enabled.len(),
            "sample_interval_ms": self.sample_interval_ms,
        })
    }
}

/// Location view: reads the simulated position without advancing the clock.
pub struct SimulatedLocationSource {
    core: Arc<Mutex<SimCore>>,
}

#[async_trait]
impl LocationSource for SimulatedLocationSource {
    fn id(&self) -> &str {
        "sim-gps"
    }

    async fn read(&mut self) -> Result<Option<LocationSample>> {
        let mut core = self.core.lock();
        let jitter = core.noise(0.4);
        Ok(Some(LocationSample {
            latitude: core.latitude,
            longitude: core.longitude,
            altitude: 1_700.0,
            speed_mps: Some((core.speed_mps + jitter).max(0.0)),
            accuracy_m: 5.0,
            bearing_deg: core.heading_rad.to_degrees().rem_euclid(360.0),
            timestamp_ms: core.time_ms,
        }))
    }

    fn apply_strategy(&mut self, _strategy: &SamplingStrategy) {
        // The manager already reads on the strategy interval.
    }
}

/// Power view over the shared battery model.
pub struct SimulatedPowerSource {
    core: Arc<Mutex<SimCore>>,
}

#[async_trait]
impl PowerSource for SimulatedPowerSource {
    async fn read(&self) -> Result<PowerTelemetry> {
        let core = self.core.lock();
        Ok(PowerTelemetry {
            battery_level: core.battery_level,
            is_charging: core.charging,
            is_power_save_mode: false,
            thermal_state: ThermalState::Normal,
            timestamp_ms: core.time_ms,
        })
    }
}
