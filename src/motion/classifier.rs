// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Activity classifier over buffered inertial samples
//!
//! Classification is a priority-ordered rule cascade, not a probability
//! model; the order of the arms is load-bearing. Absent sensors leave their
//! magnitude at zero and lower the matching class's confidence - nothing in
//! here throws past ingestion.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info};

use super::{ActivityType, MotionSnapshot};
use crate::config::MotionConfig;
use crate::core::{EventBus, SampleBuffer, SampleError};
use crate::sources::{RawSensorSample, SensorKind};

/// Classifies coarse activity from raw tri-axis sensor streams.
///
/// `ingest` appends to the matching typed buffer; `analyze` runs on the
/// analysis cadence and emits one [`MotionSnapshot`] per window. Buffer
/// writes and analysis ticks are serialized on one mutex.
pub struct MotionClassifier {
    config: MotionConfig,
    bus: Arc<EventBus>,
    inner: Mutex<ClassifierState>,
}

struct ClassifierState {
    /// Gravity-removed acceleration vectors.
    accel: SampleBuffer<[f64; 3]>,
    gyro: SampleBuffer<[f64; 3]>,
    magnetometer: SampleBuffer<[f64; 3]>,
    gravity: [f64; 3],
    step_count: u64,
    last_step_ms: Option<u64>,
    recent_steps: VecDeque<u64>,
}

impl MotionClassifier {
    /// Create a classifier publishing snapshots on `bus`.
    pub fn new(config: MotionConfig, bus: Arc<EventBus>) -> Self {
        let capacity = config.buffer_capacity;
        Self {
            config,
            bus,
            inner: Mutex::new(ClassifierState {
                accel: SampleBuffer::new(capacity),
                gyro: SampleBuffer::new(capacity),
                magnetometer: SampleBuffer::new(capacity),
                gravity: [0.0, 0.0, 9.81],
                step_count: 0,
                last_step_ms: None,
                recent_steps: VecDeque::new(),
            }),
        }
    }

    /// Append a raw sample to its typed buffer.
    ///
    /// Malformed samples (non-finite components, regressed timestamps) are
    /// rejected here and never buffered.
    pub fn ingest(&self, sample: &RawSensorSample) -> Result<(), SampleError> {
        if !sample.is_finite() {
            return Err(SampleError::NonFinite {
                timestamp_ms: sample.timestamp_ms,
            });
        }

        let mut state = self.inner.lock();
        match sample.kind {
            SensorKind::Accelerometer => {
                // Track gravity with a low-pass filter, buffer the residual.
                let alpha = self.config.gravity_alpha;
                for (g, v) in state
                    .gravity
                    .iter_mut()
                    .zip([sample.x, sample.y, sample.z])
                {
                    *g = *g * (1.0 - alpha) + v * alpha;
                }
                let linear = [
                    sample.x - state.gravity[0],
                    sample.y - state.gravity[1],
                    sample.z - state.gravity[2],
                ];
                state.accel.push(sample.timestamp_ms, linear)?;
                self.detect_step(&mut state, sample.timestamp_ms, norm(linear));
            }
            SensorKind::Gyroscope => {
                state
                    .gyro
                    .push(sample.timestamp_ms, [sample.x, sample.y, sample.z])?;
            }
            SensorKind::Magnetometer => {
                state
                    .magnetometer
                    .push(sample.timestamp_ms, [sample.x, sample.y, sample.z])?;
            }
        }
        Ok(())
    }

    fn detect_step(&self, state: &mut ClassifierState, timestamp_ms: u64, magnitude: f64) {
        if magnitude < self.config.step_peak_threshold {
            return;
        }
        let long_enough = state
            .last_step_ms
            .map(|t| timestamp_ms.saturating_sub(t) >= self.config.step_min_interval_ms)
            .unwrap_or(true);
        if long_enough {
            state.step_count += 1;
            state.last_step_ms = Some(timestamp_ms);
            state.recent_steps.push_back(timestamp_ms);
        }
    }

    /// Analyze the buffered window and emit one snapshot.
    ///
    /// Returns `None` (and emits nothing) when no accelerometer sample has
    /// been buffered yet - absence of data is not an error.
    pub fn analyze(&self) -> Option<MotionSnapshot> {
        let snapshot = {
            let mut state = self.inner.lock();
            let now = state.accel.latest_timestamp()?;

            let window = self.config.magnitude_window;
            let accel_magnitude = mean_magnitude(&state.accel, window);
            let gyro_magnitude = mean_magnitude(&state.gyro, window);
            let magnetic_magnitude = mean_magnitude(&state.magnetometer, window);

            let cutoff = now.saturating_sub(self.config.step_window_ms);
            while state
                .recent_steps
                .front()
                .map(|&t| t < cutoff)
                .unwrap_or(false)
            {
                state.recent_steps.pop_front();
            }
            let step_frequency = state.recent_steps.len() as f64
                / (self.config.step_window_ms as f64 / 1000.0);

            let activity = self.classify(accel_magnitude, gyro_magnitude, step_frequency);
            let confidence = self.confidence_for(
                activity,
                accel_magnitude,
                gyro_magnitude,
                step_frequency,
                !state.gyro.is_empty(),
            );

            let linear = state.accel.latest().map(|s| s.value).unwrap_or([0.0; 3]);

            MotionSnapshot {
                acceleration_magnitude: accel_magnitude,
                gyroscope_magnitude: gyro_magnitude,
                magnetic_field_magnitude: magnetic_magnitude,
                linear_acceleration: linear,
                gravity: state.gravity,
                activity,
                confidence,
                step_count: state.step_count,
                step_frequency,
                timestamp_ms: now,
            }
        };

        self.bus.publish_snapshot(snapshot);
        Some(snapshot)
    }

    /// Priority-ordered activity cascade. The order of the arms mirrors the
    /// classification contract and must not be reordered.
    fn classify(&self, accel: f64, gyro: f64, step_hz: f64) -> ActivityType {
        let cfg = &self.config;
        if accel < cfg.still_accel_max && gyro < cfg.still_gyro_max {
            ActivityType::Still
        } else if accel > cfg.vehicle_accel_min && gyro > cfg.vehicle_gyro_min {
            ActivityType::InVehicle
        } else if step_hz >= cfg.running_min_hz {
            ActivityType::Running
        } else if step_hz >= cfg.walking_min_hz {
            ActivityType::Walking
        } else if gyro > cfg.tilting_gyro_min {
            ActivityType::Tilting
        } else {
            ActivityType::Unknown
        }
    }

    /// Confidence rule table keyed by the chosen class and how far the
    /// magnitudes sit from the class boundary.
    fn confidence_for(
        &self,
        activity: ActivityType,
        accel: f64,
        gyro: f64,
        step_hz: f64,
        has_gyro: bool,
    ) -> f64 {
        let cfg = &self.config;
        let confidence = match activity {
            ActivityType::Still => {
                let margin = 1.0
                    - (accel / cfg.still_accel_max).max(gyro / cfg.still_gyro_max);
                let base = 0.6 + 0.35 * margin.clamp(0.0, 1.0);
                // A silent gyroscope passes the threshold trivially; trust less.
                if has_gyro {
                    base
                } else {
                    base * 0.7
                }
            }
            ActivityType::InVehicle => {
                let overshoot = ((accel - cfg.vehicle_accel_min) / cfg.vehicle_accel_min)
                    .min((gyro - cfg.vehicle_gyro_min) / cfg.vehicle_gyro_min);
                0.6 + 0.3 * overshoot.clamp(0.0, 1.0)
            }
            ActivityType::Running => {
                0.6 + 0.3 * ((step_hz - cfg.running_min_hz) / cfg.running_min_hz).clamp(0.0, 1.0)
            }
            ActivityType::Walking => {
                let mid = (cfg.walking_min_hz + cfg.running_min_hz) / 2.0;
                let half_band = (cfg.running_min_hz - cfg.walking_min_hz) / 2.0;
                let closeness = 1.0 - ((step_hz - mid).abs() / half_band).clamp(0.0, 1.0);
                0.5 + 0.4 * closeness
            }
            ActivityType::Tilting => {
                0.4 + 0.3 * (gyro / (cfg.tilting_gyro_min * 6.0)).clamp(0.0, 1.0)
            }
            ActivityType::Unknown => 0.1,
        };
        confidence.clamp(0.0, 1.0)
    }

    /// Periodic task: ingest raw samples from the bus, analyze on cadence.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> anyhow::Result<()> {
        info!("Starting motion classifier...");

        let mut raw_rx = self.bus.subscribe_raw_samples();
        let mut analysis_tick =
            interval(Duration::from_millis(self.config.analysis_interval_ms));

        loop {
            tokio::select! {
                Ok(sample) = raw_rx.recv() => {
                    if let Err(e) = self.ingest(&sample) {
                        debug!("Dropped sample: {}", e);
                    }
                }
                _ = analysis_tick.tick() => {
                    self.analyze();
                }
                _ = shutdown.recv() => {
                    info!("Motion classifier shutting down...");
                    break;
                }
            }
        }

        Ok(())
    }
}

fn norm(v: [f64; 3]) -> f64 {
    nalgebra::Vector3::from(v).norm()
}

fn mean_magnitude(buffer: &SampleBuffer<[f64; 3]>, window: usize) -> f64 {
    let tail = buffer.last_n(window);
    if tail.is_empty() {
        return 0.0;
    }
    tail.iter().map(|s| norm(s.value)).sum::<f64>() / tail.len() as f64
}
