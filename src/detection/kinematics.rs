// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Kinematic event detectors - braking, acceleration, cornering
//!
//! Each detector reads a single analysis window and either produces one
//! finding or abstains. Below the minimum sample count a detector is a
//! no-op for the tick; insufficient data is never an error.

use serde::{Deserialize, Serialize};

use super::Severity;
use crate::config::DetectionConfig;
use crate::core::TimestampedSample;

/// One detector hit: severity plus the physical quantity that tripped it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicFinding {
    /// Tiered severity.
    pub severity: Severity,
    /// Event-specific physical magnitude (m/s² for all three detectors).
    pub magnitude: f64,
    /// Detector confidence, 0-1.
    pub confidence: f64,
    /// Time spanned by the window that produced the finding.
    pub duration_ms: u64,
}

/// Speed-change rate over the window in m/s², or `None` when the window is
/// too small or spans no time.
fn speed_rate(window: &[TimestampedSample<f64>], min_samples: usize) -> Option<(f64, u64)> {
    if window.len() < min_samples {
        return None;
    }
    let first = window.first()?;
    let last = window.last()?;
    let dt_ms = last.timestamp_ms.saturating_sub(first.timestamp_ms);
    if dt_ms == 0 {
        return None;
    }
    let rate = (last.value - first.value) / (dt_ms as f64 / 1000.0);
    Some((rate, dt_ms))
}

/// Confidence scaled by how far past the trigger threshold the rate landed.
fn rate_confidence(excess: f64, threshold: f64) -> f64 {
    (0.6 + 0.35 * (excess / threshold).clamp(0.0, 1.0)).clamp(0.0, 1.0)
}

/// Hard-braking detector: deceleration rate below the braking threshold.
pub fn detect_hard_braking(
    window: &[TimestampedSample<f64>],
    config: &DetectionConfig,
) -> Option<KinematicFinding> {
    let (rate, duration_ms) = speed_rate(window, config.min_samples)?;
    if rate >= config.braking_trigger_mps2 {
        return None;
    }

    let severity = if rate < config.braking_critical_mps2 {
        Severity::Critical
    } else if rate < config.braking_high_mps2 {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(KinematicFinding {
        severity,
        magnitude: rate,
        confidence: rate_confidence(config.braking_trigger_mps2 - rate, -config.braking_trigger_mps2),
        duration_ms,
    })
}

/// Rapid-acceleration detector: the symmetric positive-rate test.
pub fn detect_rapid_acceleration(
    window: &[TimestampedSample<f64>],
    config: &DetectionConfig,
) -> Option<KinematicFinding> {
    let (rate, duration_ms) = speed_rate(window, config.min_samples)?;
    if rate <= config.acceleration_trigger_mps2 {
        return None;
    }

    let severity = if rate >= config.acceleration_critical_mps2 {
        Severity::Critical
    } else if rate >= config.acceleration_high_mps2 {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(KinematicFinding {
        severity,
        magnitude: rate,
        confidence: rate_confidence(
            rate - config.acceleration_trigger_mps2,
            config.acceleration_trigger_mps2,
        ),
        duration_ms,
    })
}

/// Harsh-cornering detector.
///
/// Peak angular velocity times current speed approximates lateral
/// acceleration; the tiers sit on that approximation.
pub fn detect_harsh_cornering(
    peak_gyro_rad_s: f64,
    speed_mps: f64,
    window_ms: u64,
    config: &DetectionConfig,
) -> Option<KinematicFinding> {
    let lateral = peak_gyro_rad_s * speed_mps;
    if lateral <= config.cornering_trigger_mps2 {
        return None;
    }

    let severity = if lateral >= config.cornering_critical_mps2 {
        Severity::Critical
    } else if lateral >= config.cornering_high_mps2 {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(KinematicFinding {
        severity,
        magnitude: lateral,
        confidence: rate_confidence(
            lateral - config.cornering_trigger_mps2,
            config.cornering_trigger_mps2,
        ),
        duration_ms: window_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Window of speeds producing exactly `rate` m/s² over one second.
    fn window_with_rate(rate: f64) -> Vec<TimestampedSample<f64>> {
        // Six samples, 200 ms apart; start fast enough to stay non-negative.
        (0..6u64)
            .map(|i| TimestampedSample {
                timestamp_ms: i * 200,
                value: 20.0 + rate * (i as f64 * 0.2),
            })
            .collect()
    }

    fn config() -> DetectionConfig {
        DetectionConfig::default()
    }

    #[test]
    fn braking_severity_tiers() {
        let cases = [
            (-9.0, Some(Severity::Critical)),
            (-8.0, Some(Severity::High)), // boundary: -8.0 is not < -8.0
            (-7.0, Some(Severity::High)),
            (-6.0, Some(Severity::Medium)), // boundary: -6.0 is not < -6.0
            (-5.7, Some(Severity::Medium)),
            (-5.5, None),
            (-3.0, None),
            (2.0, None),
        ];

        for (rate, expected) in cases {
            let finding = detect_hard_braking(&window_with_rate(rate), &config());
            assert_eq!(
                finding.map(|f| f.severity),
                expected,
                "rate {} m/s²",
                rate
            );
        }
    }

    #[test]
    fn braking_magnitude_carries_the_rate() {
        let finding = detect_hard_braking(&window_with_rate(-7.0), &config()).unwrap();
        assert!((finding.magnitude - -7.0).abs() < 1e-9);
        assert!(finding.confidence > 0.6 && finding.confidence <= 1.0);
    }

    #[test]
    fn acceleration_severity_tiers() {
        let cases = [
            (6.5, Some(Severity::Critical)),
            (6.0, Some(Severity::Critical)),
            (5.5, Some(Severity::High)),
            (4.7, Some(Severity::Medium)),
            (4.5, None),
            (-2.0, None),
        ];

        for (rate, expected) in cases {
            let finding = detect_rapid_acceleration(&window_with_rate(rate), &config());
            assert_eq!(
                finding.map(|f| f.severity),
                expected,
                "rate {} m/s²",
                rate
            );
        }
    }

    #[test]
    fn detectors_abstain_below_minimum_sample_count() {
        let short: Vec<_> = window_with_rate(-9.0).into_iter().take(3).collect();
        assert!(detect_hard_braking(&short, &config()).is_none());
        let short: Vec<_> = window_with_rate(9.0).into_iter().take(3).collect();
        assert!(detect_rapid_acceleration(&short, &config()).is_none());
    }

    #[test]
    fn cornering_uses_lateral_acceleration_approximation() {
        let cfg = config();
        // 0.5 rad/s at 12 m/s: 6.0 m/s² lateral -> High.
        let finding = detect_harsh_cornering(0.5, 12.0, 3000, &cfg).unwrap();
        assert_eq!(finding.severity, Severity::High);

        // 0.8 rad/s at 11 m/s: 8.8 m/s² -> Critical.
        let finding = detect_harsh_cornering(0.8, 11.0, 3000, &cfg).unwrap();
        assert_eq!(finding.severity, Severity::Critical);

        // 0.5 rad/s at 11.2 m/s: 5.6 m/s² -> Medium.
        let finding = detect_harsh_cornering(0.5, 11.2, 3000, &cfg).unwrap();
        assert_eq!(finding.severity, Severity::Medium);

        // Gentle turn: no event.
        assert!(detect_harsh_cornering(0.2, 10.0, 3000, &cfg).is_none());
    }
}
