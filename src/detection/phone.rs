// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Phone-usage detection - weighted fusion of independent pattern scores
//!
//! Five bounded [0,1] heuristics are scored over the trip's recent pattern
//! window and fused as a weighted sum. The fusion is monotonic in every
//! sub-score by construction (fixed non-negative weights). The audio factor
//! is a periodicity proxy computed from the inertial stream; this core has
//! no audio producer.

use serde::{Deserialize, Serialize};

use super::Severity;
use crate::config::PhoneUsageConfig;
use crate::core::TimestampedSample;
use crate::motion::MotionSnapshot;

/// The five independently-scored phone-usage factors, each in [0,1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneUsageScores {
    /// Hand-movement pattern (weight 0.25).
    pub hand_movement: f64,
    /// Driving-disruption pattern (weight 0.30).
    pub driving_disruption: f64,
    /// Device-orientation-change pattern (weight 0.20).
    pub orientation_change: f64,
    /// Audio-periodicity proxy (weight 0.15).
    pub audio_periodicity: f64,
    /// Speed-correlation pattern (weight 0.10).
    pub speed_correlation: f64,
}

impl PhoneUsageScores {
    /// Weighted fusion of the five factors.
    pub fn fused(&self, config: &PhoneUsageConfig) -> f64 {
        let p = self.hand_movement * config.hand_movement_weight
            + self.driving_disruption * config.driving_disruption_weight
            + self.orientation_change * config.orientation_change_weight
            + self.audio_periodicity * config.audio_periodicity_weight
            + self.speed_correlation * config.speed_correlation_weight;
        p.clamp(0.0, 1.0)
    }
}

/// Score the pattern window.
///
/// `snapshots` and `speeds` are the last pattern-window's worth of motion
/// snapshots and speed samples, oldest first.
pub fn score_pattern_window(
    snapshots: &[TimestampedSample<MotionSnapshot>],
    speeds: &[TimestampedSample<f64>],
    config: &PhoneUsageConfig,
) -> PhoneUsageScores {
    PhoneUsageScores {
        hand_movement: hand_movement_score(snapshots, config),
        driving_disruption: driving_disruption_score(speeds, config),
        orientation_change: orientation_change_score(snapshots, config),
        audio_periodicity: periodicity_proxy_score(snapshots, config),
        speed_correlation: speed_correlation_score(speeds),
    }
}

/// Severity for a fused probability, or `None` below the emit threshold.
pub fn classify_phone_usage(fused: f64, config: &PhoneUsageConfig) -> Option<Severity> {
    if fused <= config.emit_threshold {
        return None;
    }
    Some(if fused >= config.critical_threshold {
        Severity::Critical
    } else if fused >= config.high_threshold {
        Severity::High
    } else if fused >= config.medium_threshold {
        Severity::Medium
    } else {
        Severity::Low
    })
}

/// Handling motion: snapshots whose linear acceleration sits in the
/// hand-movement band, too strong for a cradled phone and too weak for
/// vehicle dynamics.
fn hand_movement_score(
    snapshots: &[TimestampedSample<MotionSnapshot>],
    config: &PhoneUsageConfig,
) -> f64 {
    let in_band = snapshots
        .iter()
        .filter(|s| {
            s.value.acceleration_magnitude >= config.hand_band_low_mps2
                && s.value.acceleration_magnitude <= config.hand_band_high_mps2
        })
        .count();

    match in_band {
        n if n >= 8 => 1.0,
        n if n >= 5 => 0.7,
        n if n >= 3 => 0.4,
        n if n >= 1 => 0.2,
        _ => 0.0,
    }
}

/// Disrupted driving: speed-trend reversals stronger than the noise floor.
fn driving_disruption_score(
    speeds: &[TimestampedSample<f64>],
    config: &PhoneUsageConfig,
) -> f64 {
    let mut reversals = 0usize;
    let mut previous_delta = 0.0f64;
    for pair in speeds.windows(2) {
        let delta = pair[1].value - pair[0].value;
        if delta.abs() < config.disruption_delta_mps {
            continue;
        }
        if previous_delta != 0.0 && delta.signum() != previous_delta.signum() {
            reversals += 1;
        }
        previous_delta = delta;
    }

    match reversals {
        n if n >= 4 => 1.0,
        3 => 0.7,
        2 => 0.4,
        1 => 0.2,
        _ => 0.0,
    }
}

/// Orientation churn: gyroscope spikes within the window.
fn orientation_change_score(
    snapshots: &[TimestampedSample<MotionSnapshot>],
    config: &PhoneUsageConfig,
) -> f64 {
    let spikes = snapshots
        .iter()
        .filter(|s| s.value.gyroscope_magnitude > config.orientation_spike_rad_s)
        .count();

    match spikes {
        n if n >= 3 => 1.0,
        2 => 0.7,
        1 => 0.3,
        _ => 0.0,
    }
}

/// Audio-periodicity proxy: regularity of accelerometer activity peaks.
/// Regularly spaced handling bursts score high; sporadic road noise does not.
fn periodicity_proxy_score(
    snapshots: &[TimestampedSample<MotionSnapshot>],
    config: &PhoneUsageConfig,
) -> f64 {
    let peaks: Vec<u64> = snapshots
        .iter()
        .filter(|s| s.value.acceleration_magnitude > config.periodicity_peak_mps2)
        .map(|s| s.timestamp_ms)
        .collect();
    if peaks.len() < 3 {
        return 0.0;
    }

    let intervals: Vec<f64> = peaks
        .windows(2)
        .map(|p| (p[1] - p[0]) as f64)
        .collect();
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = intervals
        .iter()
        .map(|i| (i - mean).powi(2))
        .sum::<f64>()
        / intervals.len() as f64;
    let cv = variance.sqrt() / mean;

    (1.0 - cv).clamp(0.0, 1.0)
}

/// Slowing while the traffic has not: mean speed of the window's last third
/// against its first third.
fn speed_correlation_score(speeds: &[TimestampedSample<f64>]) -> f64 {
    if speeds.len() < 6 {
        return 0.0;
    }
    let third = speeds.len() / 3;
    let early: f64 =
        speeds[..third].iter().map(|s| s.value).sum::<f64>() / third as f64;
    let late: f64 = speeds[speeds.len() - third..]
        .iter()
        .map(|s| s.value)
        .sum::<f64>()
        / third as f64;

    if early < 1.0 {
        return 0.0;
    }
    let ratio = late / early;
    if ratio < 0.7 {
        0.8
    } else if ratio < 0.85 {
        0.4
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PhoneUsageConfig {
        PhoneUsageConfig::default()
    }

    fn scores(v: f64) -> PhoneUsageScores {
        PhoneUsageScores {
            hand_movement: v,
            driving_disruption: v,
            orientation_change: v,
            audio_periodicity: v,
            speed_correlation: v,
        }
    }

    #[test]
    fn fusion_is_monotonic_in_every_factor() {
        let cfg = config();
        let base = scores(0.5);
        let fused_base = base.fused(&cfg);

        for bump in 0..5 {
            let mut bumped = base;
            match bump {
                0 => bumped.hand_movement = 0.9,
                1 => bumped.driving_disruption = 0.9,
                2 => bumped.orientation_change = 0.9,
                3 => bumped.audio_periodicity = 0.9,
                _ => bumped.speed_correlation = 0.9,
            }
            assert!(
                bumped.fused(&cfg) >= fused_base,
                "raising factor {} lowered the fusion",
                bump
            );
        }
    }

    #[test]
    fn fusion_weights_sum_to_one() {
        let cfg = config();
        assert!((scores(1.0).fused(&cfg) - 1.0).abs() < 1e-9);
        assert_eq!(scores(0.0).fused(&cfg), 0.0);
    }

    #[test]
    fn severity_escalates_with_fused_probability() {
        let cfg = config();
        assert_eq!(classify_phone_usage(0.80, &cfg), None);
        assert_eq!(classify_phone_usage(0.82, &cfg), Some(Severity::Low));
        assert_eq!(classify_phone_usage(0.86, &cfg), Some(Severity::Medium));
        assert_eq!(classify_phone_usage(0.92, &cfg), Some(Severity::High));
        assert_eq!(classify_phone_usage(0.97, &cfg), Some(Severity::Critical));
    }

    #[test]
    fn orientation_spike_counts_map_to_documented_scores() {
        let cfg = config();
        let snapshot = |ts: u64, gyro: f64| TimestampedSample {
            timestamp_ms: ts,
            value: MotionSnapshot {
                acceleration_magnitude: 0.0,
                gyroscope_magnitude: gyro,
                magnetic_field_magnitude: 0.0,
                linear_acceleration: [0.0; 3],
                gravity: [0.0, 0.0, 9.81],
                activity: crate::motion::ActivityType::InVehicle,
                confidence: 0.8,
                step_count: 0,
                step_frequency: 0.0,
                timestamp_ms: ts,
            },
        };

        let spikes =
            |n: usize| -> Vec<_> { (0..n as u64).map(|i| snapshot(i * 1000, 2.0)).collect() };

        assert_eq!(orientation_change_score(&spikes(0), &cfg), 0.0);
        assert_eq!(orientation_change_score(&spikes(1), &cfg), 0.3);
        assert_eq!(orientation_change_score(&spikes(2), &cfg), 0.7);
        assert_eq!(orientation_change_score(&spikes(3), &cfg), 1.0);
        assert_eq!(orientation_change_score(&spikes(5), &cfg), 1.0);
    }

    #[test]
    fn disruption_counts_speed_trend_reversals() {
        let cfg = config();
        let series = |values: &[f64]| -> Vec<TimestampedSample<f64>> {
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| TimestampedSample {
                    timestamp_ms: i as u64 * 1000,
                    value: v,
                })
                .collect()
        };

        // Monotonic speeds: no reversal.
        assert_eq!(
            driving_disruption_score(&series(&[5.0, 6.0, 7.0, 8.0]), &cfg),
            0.0
        );
        // Speed up, slow down, speed up, slow down: three reversals.
        assert_eq!(
            driving_disruption_score(&series(&[5.0, 8.0, 5.0, 8.0, 5.0]), &cfg),
            0.7
        );
    }
}
