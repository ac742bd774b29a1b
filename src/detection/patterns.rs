// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Behavior-pattern detectors over already-recorded events
//!
//! Unlike the kinematic detectors these consume the detector's own event
//! history (aggressive) or whole pattern windows (smooth, eco), so they run
//! on the slower pattern cadence or at the end of an analysis tick.

use super::{DrivingEvent, EventType, Severity};

/// Event types that count toward an aggressive-driving cluster.
fn is_harsh_type(event_type: EventType) -> bool {
    matches!(
        event_type,
        EventType::HardBraking
            | EventType::RapidAcceleration
            | EventType::HarshCornering
            | EventType::Speeding
    )
}

/// Count harsh (severity >= Medium) kinetic/speeding events in the window.
pub fn count_harsh_events(events: &[DrivingEvent], now_ms: u64, window_ms: u64) -> usize {
    let cutoff = now_ms.saturating_sub(window_ms);
    events
        .iter()
        .filter(|e| e.timestamp_ms >= cutoff)
        .filter(|e| is_harsh_type(e.event_type) && e.severity >= Severity::Medium)
        .count()
}

/// Aggressive driving: enough harsh events clustered in the window.
///
/// Returns the cluster size when the pattern fires.
pub fn detect_aggressive_driving(
    events: &[DrivingEvent],
    now_ms: u64,
    window_ms: u64,
    min_events: usize,
) -> Option<usize> {
    let count = count_harsh_events(events, now_ms, window_ms);
    (count >= min_events).then_some(count)
}

/// Smooth driving: a moving window without any harsh event.
pub fn detect_smooth_driving(
    events: &[DrivingEvent],
    now_ms: u64,
    window_ms: u64,
    average_speed_kmh: f64,
    min_average_kmh: f64,
) -> bool {
    if average_speed_kmh <= min_average_kmh {
        return false;
    }
    let cutoff = now_ms.saturating_sub(window_ms);
    !events
        .iter()
        .filter(|e| e.timestamp_ms >= cutoff)
        .any(|e| e.severity >= Severity::Medium)
}

/// Eco driving: the window's acceleration samples sit in the gentle band.
///
/// Returns the in-band fraction when it reaches the required share.
pub fn detect_eco_driving(
    acceleration_magnitudes: &[f64],
    band_low: f64,
    band_high: f64,
    min_fraction: f64,
) -> Option<f64> {
    if acceleration_magnitudes.is_empty() {
        return None;
    }
    let in_band = acceleration_magnitudes
        .iter()
        .filter(|&&m| m >= band_low && m <= band_high)
        .count();
    let fraction = in_band as f64 / acceleration_magnitudes.len() as f64;
    (fraction >= min_fraction).then_some(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(ts: u64, event_type: EventType, severity: Severity) -> DrivingEvent {
        DrivingEvent {
            id: format!("test-{}", ts),
            event_type,
            severity,
            timestamp_ms: ts,
            recorded_at: Utc::now(),
            latitude: None,
            longitude: None,
            speed_mps: None,
            magnitude: 0.0,
            duration_ms: 0,
            confidence: 0.9,
            context: None,
        }
    }

    #[test]
    fn aggressive_fires_on_three_harsh_events_in_window() {
        let events = vec![
            event(1_000, EventType::HardBraking, Severity::Medium),
            event(10_000, EventType::Speeding, Severity::High),
            event(20_000, EventType::HarshCornering, Severity::Medium),
        ];
        assert_eq!(
            detect_aggressive_driving(&events, 25_000, 30_000, 3),
            Some(3)
        );
    }

    #[test]
    fn aggressive_ignores_low_severity_and_stale_events() {
        let events = vec![
            // Low severity: does not count.
            event(10_000, EventType::HardBraking, Severity::Low),
            // Outside the window: does not count.
            event(1_000, EventType::Speeding, Severity::High),
            event(35_000, EventType::RapidAcceleration, Severity::Medium),
            event(38_000, EventType::HarshCornering, Severity::High),
        ];
        assert_eq!(detect_aggressive_driving(&events, 40_000, 30_000, 3), None);
    }

    #[test]
    fn aggressive_ignores_non_kinetic_types() {
        let events = vec![
            event(1_000, EventType::PhoneUsage, Severity::High),
            event(2_000, EventType::PhoneUsage, Severity::High),
            event(3_000, EventType::PhoneUsage, Severity::High),
        ];
        assert_eq!(detect_aggressive_driving(&events, 5_000, 30_000, 3), None);
    }

    #[test]
    fn smooth_requires_motion_and_a_clean_window() {
        let clean: Vec<DrivingEvent> = Vec::new();
        assert!(detect_smooth_driving(&clean, 30_000, 30_000, 40.0, 5.0));
        // Too slow: parked lots do not earn smooth-driving credit.
        assert!(!detect_smooth_driving(&clean, 30_000, 30_000, 3.0, 5.0));

        let harsh = vec![event(20_000, EventType::HardBraking, Severity::Medium)];
        assert!(!detect_smooth_driving(&harsh, 30_000, 30_000, 40.0, 5.0));

        // The harsh event has aged out of the window.
        assert!(detect_smooth_driving(&harsh, 60_000, 30_000, 40.0, 5.0));
    }

    #[test]
    fn eco_requires_eighty_percent_in_band() {
        // 9 of 10 gentle: fires.
        let mut samples = vec![1.0; 9];
        samples.push(4.0);
        let fraction = detect_eco_driving(&samples, 0.5, 2.0, 0.8).unwrap();
        assert!((fraction - 0.9).abs() < 1e-9);

        // 7 of 10 gentle: abstains.
        let mut samples = vec![1.0; 7];
        samples.extend([4.0, 4.0, 4.0]);
        assert!(detect_eco_driving(&samples, 0.5, 2.0, 0.8).is_none());

        // Idling (below the band) is not eco driving.
        assert!(detect_eco_driving(&[0.1; 10], 0.5, 2.0, 0.8).is_none());
    }
}
