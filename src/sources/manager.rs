// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Source manager - pumps raw samples onto the bus
//!
//! Reads the sensor and location sources on intervals dictated by the
//! current [`SamplingStrategy`](crate::sampling::SamplingStrategy) and
//! publishes everything onto the event bus. Strategy updates arriving on
//! the bus close the feedback loop: they re-arm the read intervals and are
//! forwarded to the sources so hardware producers can throttle themselves.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

use super::{LocationSource, SensorSource, SourceHealth};
use crate::core::EventBus;
use crate::sampling::SensorRate;

/// Owns the raw-sample producers and their health bookkeeping.
pub struct SourceManager {
    bus: Arc<EventBus>,
    sensor_id: String,
    location_id: String,
    sensors: tokio::sync::Mutex<Box<dyn SensorSource>>,
    location: tokio::sync::Mutex<Box<dyn LocationSource>>,
    health: parking_lot::Mutex<HashMap<String, SourceHealth>>,
}

impl SourceManager {
    /// Create a manager over the two raw producers.
    pub fn new(
        bus: Arc<EventBus>,
        sensors: Box<dyn SensorSource>,
        location: Box<dyn LocationSource>,
    ) -> Self {
        let sensor_id = sensors.id().to_string();
        let location_id = location.id().to_string();

        let mut health = HashMap::new();
        health.insert(sensor_id.clone(), SourceHealth::default());
        health.insert(location_id.clone(), SourceHealth::default());

        Self {
            bus,
            sensor_id,
            location_id,
            sensors: tokio::sync::Mutex::new(sensors),
            location: tokio::sync::Mutex::new(location),
            health: parking_lot::Mutex::new(health),
        }
    }

    /// Health counters for one source.
    pub fn health(&self, id: &str) -> Option<SourceHealth> {
        self.health.lock().get(id).cloned()
    }

    /// Health counters for every source.
    pub fn all_health(&self) -> Vec<SourceHealth> {
        self.health.lock().values().cloned().collect()
    }

    fn record_success(&self, id: &str, readings: u64) {
        if let Some(h) = self.health.lock().get_mut(id) {
            h.readings_count += readings;
        }
    }

    fn record_error(&self, id: &str, error: &anyhow::Error) {
        if let Some(h) = self.health.lock().get_mut(id) {
            h.error_count += 1;
            h.last_error = Some(error.to_string());
        }
    }

    /// Pump loop: read sources on strategy-derived intervals.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!("Starting source manager...");

        let mut strategy_rx = self.bus.subscribe_strategies();
        let mut sensor_tick =
            interval(Duration::from_millis(SensorRate::Normal.interval_ms()));
        let mut location_tick = interval(Duration::from_millis(2_000));

        loop {
            tokio::select! {
                _ = sensor_tick.tick() => {
                    let batch = self.sensors.lock().await.read().await;
                    match batch {
                        Ok(samples) => {
                            self.record_success(&self.sensor_id, samples.len() as u64);
                            for sample in samples {
                                self.bus.publish_raw_sample(sample);
                            }
                        }
                        Err(e) => {
                            self.record_error(&self.sensor_id, &e);
                            debug!("Sensor read error: {}", e);
                        }
                    }
                }
                _ = location_tick.tick() => {
                    let fix = self.location.lock().await.read().await;
                    match fix {
                        Ok(Some(fix)) => {
                            self.record_success(&self.location_id, 1);
                            self.bus.publish_location(fix);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            self.record_error(&self.location_id, &e);
                            debug!("Location read error: {}", e);
                        }
                    }
                }
                Ok(strategy) = strategy_rx.recv() => {
                    self.sensors.lock().await.apply_strategy(&strategy);
                    self.location.lock().await.apply_strategy(&strategy);
                    sensor_tick = interval(Duration::from_millis(
                        strategy.sensor_rate.interval_ms(),
                    ));
                    location_tick = interval(Duration::from_millis(
                        strategy.location_interval_ms.max(1),
                    ));
                    info!(
                        location_interval_ms = strategy.location_interval_ms,
                        sensor_rate = ?strategy.sensor_rate,
                        "Source intervals re-armed from strategy"
                    );
                }
                _ = shutdown.recv() => {
                    info!("Source manager shutting down...");
                    break;
                }
            }
        }

        let total_errors: u64 = self.all_health().iter().map(|h| h.error_count).sum();
        if total_errors > 0 {
            warn!("Source manager saw {} read errors this session", total_errors);
        }
        Ok(())
    }
}
