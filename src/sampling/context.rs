// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Driving-context classification from a rolling speed window

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SamplingConfig;
use crate::core::SampleBuffer;

/// Coarse driving regime derived from the speed history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrivingContext {
    /// Stationary for an extended period.
    Parked,
    /// Moderate speed, moderate variance.
    CityDriving,
    /// Sustained high speed, low variance.
    HighwayDriving,
    /// Low average speed with high variance.
    StopAndGo,
    /// Window empty or ambiguous.
    Unknown,
}

/// Classifies the driving context over a rolling speed window.
///
/// Owns its own speed history, separate from the event detector's buffers
/// even though both read the same upstream location stream. Parked is
/// sticky: leaving it requires sustained movement across the window, so a
/// single spurious GPS speed spike cannot unpark the vehicle.
pub struct ContextClassifier {
    config: SamplingConfig,
    speeds: SampleBuffer<f64>,
    first_sample_ms: Option<u64>,
    last_movement_ms: Option<u64>,
    current: DrivingContext,
}

impl ContextClassifier {
    /// Create a classifier with the given sampling configuration.
    pub fn new(config: SamplingConfig) -> Self {
        let capacity = config.speed_history_capacity;
        Self {
            config,
            speeds: SampleBuffer::new(capacity),
            first_sample_ms: None,
            last_movement_ms: None,
            current: DrivingContext::Unknown,
        }
    }

    /// Record a speed observation from the location stream.
    pub fn observe(&mut self, timestamp_ms: u64, speed_mps: f64) {
        if !speed_mps.is_finite() || speed_mps < 0.0 {
            return;
        }
        if self.speeds.push(timestamp_ms, speed_mps).is_err() {
            return;
        }
        self.first_sample_ms.get_or_insert(timestamp_ms);
        if speed_mps > self.config.movement_threshold_mps {
            self.last_movement_ms = Some(timestamp_ms);
        }
    }

    /// The most recently classified context.
    pub fn current(&self) -> DrivingContext {
        self.current
    }

    /// Re-evaluate the context against the full rolling window.
    pub fn classify(&mut self) -> DrivingContext {
        let next = self.evaluate();
        if next != self.current {
            debug!(from = ?self.current, to = ?next, "driving context changed");
            self.current = next;
        }
        self.current
    }

    fn evaluate(&self) -> DrivingContext {
        let window = self.speeds.window_ms(self.config.context_window_ms);
        if window.is_empty() {
            // No data cannot unpark a parked vehicle.
            return if self.current == DrivingContext::Parked {
                DrivingContext::Parked
            } else {
                DrivingContext::Unknown
            };
        }

        let now = window.last().map(|s| s.timestamp_ms).unwrap_or(0);
        let threshold = self.config.movement_threshold_mps;
        let moving_count = window.iter().filter(|s| s.value > threshold).count();
        let all_stationary = moving_count == 0;

        // Sticky exit: the whole window has to show movement, not one spike.
        if self.current == DrivingContext::Parked
            && moving_count < self.config.unpark_min_samples
        {
            return DrivingContext::Parked;
        }

        // Parked entry: prolonged stillness and a fully stationary window.
        let since_movement = match self.last_movement_ms {
            Some(t) => now.saturating_sub(t),
            None => now.saturating_sub(self.first_sample_ms.unwrap_or(now)),
        };
        if all_stationary && since_movement >= self.config.parked_after_ms {
            return DrivingContext::Parked;
        }

        let mean = window.iter().map(|s| s.value).sum::<f64>() / window.len() as f64;
        let variance = window
            .iter()
            .map(|s| (s.value - mean).powi(2))
            .sum::<f64>()
            / window.len() as f64;
        let mean_kmh = mean * 3.6;

        if mean > self.config.highway_min_mps && variance < self.config.highway_max_variance {
            return DrivingContext::HighwayDriving;
        }
        // StopAndGo before City: city inherits only the calmer windows.
        if mean_kmh > self.config.stop_and_go_min_kmh
            && variance > self.config.stop_and_go_min_variance
        {
            return DrivingContext::StopAndGo;
        }
        if mean_kmh > self.config.city_min_kmh && mean_kmh <= self.config.city_max_kmh {
            return DrivingContext::CityDriving;
        }

        DrivingContext::Unknown
    }
}
