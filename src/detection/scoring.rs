// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Trip scoring - four sub-scores, risk factors, trip statistics
//!
//! Runs exactly once per trip, at stop time, over the accumulated event
//! list. Every sub-score is clamped to [0,100] and every ratio carries a
//! denominator floor of 1, so degenerate trips score rather than panic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DrivingEvent, EventType, Severity};

/// Hard-braking events tolerated before a risk factor accrues; road-surface
/// artifacts routinely cause a few phantom braking hits per trip.
const HARD_BRAKING_TOLERANCE: usize = 3;
/// Rapid-acceleration events tolerated before a risk factor accrues.
const RAPID_ACCELERATION_TOLERANCE: usize = 3;
/// Harsh-cornering events tolerated before a risk factor accrues.
const HARSH_CORNERING_TOLERANCE: usize = 3;
/// Speeding events tolerated before a risk factor accrues.
const SPEEDING_TOLERANCE: usize = 2;
/// Phone usage is never tolerated.
const PHONE_USAGE_TOLERANCE: usize = 0;

/// Aggregate statistics for a completed trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TripStatistics {
    /// Great-circle distance accumulated over consecutive fixes.
    pub distance_m: f64,
    /// Wall-clock trip duration.
    pub duration_ms: u64,
    /// Mean of the buffered speed samples.
    pub average_speed_kmh: f64,
    /// Fastest buffered speed sample.
    pub max_speed_kmh: f64,
    /// Time spent over the posted limit.
    pub speeding_duration_ms: u64,
    /// Time spent below the movement threshold.
    pub idle_time_ms: u64,
    /// Share of the trip in night hours, 0-100.
    pub night_driving_percent: f64,
}

/// Typed risk factor categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFactorType {
    /// More hard-braking events than the tolerance allows.
    FrequentHardBraking,
    /// More rapid-acceleration events than the tolerance allows.
    FrequentRapidAcceleration,
    /// More harsh-cornering events than the tolerance allows.
    FrequentHarshCornering,
    /// More speeding events than the tolerance allows.
    RepeatedSpeeding,
    /// Any phone usage while driving.
    PhoneDistraction,
}

/// One risk factor derived from the trip's event counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Category.
    pub factor_type: RiskFactorType,
    /// Penalty points, always negative.
    pub penalty_points: i32,
    /// Events of the category observed this trip.
    pub occurrence_count: usize,
    /// Human-readable explanation for reports.
    pub message: String,
}

/// The scored summary of one completed trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripScore {
    /// Unweighted mean of the four sub-scores, 0-100.
    pub overall_score: f64,
    /// Penalty-weighted safety sub-score, 0-100.
    pub safety_score: f64,
    /// Eco-versus-aggressive sub-score, 0-100.
    pub efficiency_score: f64,
    /// Smooth-versus-harsh sub-score, 0-100.
    pub smoothness_score: f64,
    /// Share of the trip spent inside the limit, 0-100.
    pub legal_compliance_score: f64,
    /// Every event the trip recorded, in emission order.
    pub events: Vec<DrivingEvent>,
    /// Aggregate trip statistics.
    pub statistics: TripStatistics,
    /// Risk factors derived from the event counts.
    pub risk_factors: Vec<RiskFactor>,
    /// Trip open time.
    pub started_at: DateTime<Utc>,
    /// Trip close time.
    pub ended_at: DateTime<Utc>,
}

fn count_of(events: &[DrivingEvent], event_type: EventType) -> usize {
    events.iter().filter(|e| e.event_type == event_type).count()
}

/// Safety: 100 × (1 − penaltySum / maxPossiblePenalty) over the four
/// penalized event types. A trip without penalized events is neutral.
fn safety_score(events: &[DrivingEvent]) -> f64 {
    let penalized: Vec<&DrivingEvent> = events
        .iter()
        .filter(|e| {
            matches!(
                e.event_type,
                EventType::HardBraking
                    | EventType::RapidAcceleration
                    | EventType::HarshCornering
                    | EventType::PhoneUsage
            )
        })
        .collect();

    if penalized.is_empty() {
        return 100.0;
    }
    let penalty_sum: u32 = penalized.iter().map(|e| e.severity.penalty_weight()).sum();
    let max_penalty = (penalized.len() as u32 * Severity::Critical.penalty_weight()).max(1);
    (100.0 * (1.0 - penalty_sum as f64 / max_penalty as f64)).clamp(0.0, 100.0)
}

/// Efficiency: eco windows against aggressive accelerate/brake events.
fn efficiency_score(events: &[DrivingEvent]) -> f64 {
    let eco = count_of(events, EventType::EcoDriving);
    let aggressive = events
        .iter()
        .filter(|e| {
            matches!(
                e.event_type,
                EventType::HardBraking | EventType::RapidAcceleration
            ) && e.severity >= Severity::High
        })
        .count();
    (100.0 * eco as f64 / (eco + aggressive).max(1) as f64).clamp(0.0, 100.0)
}

/// Smoothness: smooth windows against harsh kinetic events.
fn smoothness_score(events: &[DrivingEvent]) -> f64 {
    let smooth = count_of(events, EventType::SmoothDriving);
    let harsh = events
        .iter()
        .filter(|e| {
            matches!(
                e.event_type,
                EventType::HardBraking
                    | EventType::RapidAcceleration
                    | EventType::HarshCornering
            ) && e.severity >= Severity::Medium
        })
        .count();
    (100.0 * smooth as f64 / (smooth + harsh).max(1) as f64).clamp(0.0, 100.0)
}

/// Legal compliance: share of the trip spent inside the posted limit.
fn legal_compliance_score(statistics: &TripStatistics) -> f64 {
    let duration = statistics.duration_ms.max(1) as f64;
    let speeding = statistics.speeding_duration_ms.min(statistics.duration_ms) as f64;
    (100.0 * (duration - speeding) / duration).clamp(0.0, 100.0)
}

fn risk_factors(events: &[DrivingEvent]) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    let mut push = |factor_type: RiskFactorType,
                    event_type: EventType,
                    tolerance: usize,
                    points_per_excess: i32,
                    noun: &str| {
        let count = count_of(events, event_type);
        if count > tolerance {
            let excess = count - tolerance;
            factors.push(RiskFactor {
                factor_type,
                penalty_points: -(excess as i32 * points_per_excess),
                occurrence_count: count,
                message: format!("{} {} events this trip ({} tolerated)", count, noun, tolerance),
            });
        }
    };

    push(
        RiskFactorType::FrequentHardBraking,
        EventType::HardBraking,
        HARD_BRAKING_TOLERANCE,
        2,
        "hard-braking",
    );
    push(
        RiskFactorType::FrequentRapidAcceleration,
        EventType::RapidAcceleration,
        RAPID_ACCELERATION_TOLERANCE,
        2,
        "rapid-acceleration",
    );
    push(
        RiskFactorType::FrequentHarshCornering,
        EventType::HarshCornering,
        HARSH_CORNERING_TOLERANCE,
        2,
        "harsh-cornering",
    );
    push(
        RiskFactorType::RepeatedSpeeding,
        EventType::Speeding,
        SPEEDING_TOLERANCE,
        3,
        "speeding",
    );
    push(
        RiskFactorType::PhoneDistraction,
        EventType::PhoneUsage,
        PHONE_USAGE_TOLERANCE,
        5,
        "phone-usage",
    );

    factors
}

/// Compute the trip score from the accumulated events and statistics.
///
/// An empty event list scores neutral (100 across the board); the detector
/// normally early-returns on empty trips before reaching this.
pub fn compute_trip_score(
    events: &[DrivingEvent],
    statistics: TripStatistics,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> TripScore {
    let safety = safety_score(events);
    let efficiency = if events.is_empty() {
        100.0
    } else {
        efficiency_score(events)
    };
    let smoothness = if events.is_empty() {
        100.0
    } else {
        smoothness_score(events)
    };
    let legal = legal_compliance_score(&statistics);
    let overall = ((safety + efficiency + smoothness + legal) / 4.0).clamp(0.0, 100.0);

    TripScore {
        overall_score: overall,
        safety_score: safety,
        efficiency_score: efficiency,
        smoothness_score: smoothness,
        legal_compliance_score: legal,
        events: events.to_vec(),
        statistics,
        risk_factors: risk_factors(events),
        started_at,
        ended_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

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

    fn ten_minute_stats() -> TripStatistics {
        TripStatistics {
            distance_m: 6_666.0,
            duration_ms: 600_000,
            average_speed_kmh: 40.0,
            max_speed_kmh: 62.0,
            speeding_duration_ms: 0,
            idle_time_ms: 30_000,
            night_driving_percent: 0.0,
        }
    }

    #[test]
    fn ten_minute_reference_trip() {
        // One Medium hard braking, one Low smooth driving, no speeding time.
        let events = vec![
            event(120_000, EventType::HardBraking, Severity::Medium),
            event(300_000, EventType::SmoothDriving, Severity::Low),
        ];
        let start = Utc::now();
        let score =
            compute_trip_score(&events, ten_minute_stats(), start, start + Duration::minutes(10));

        assert_eq!(score.legal_compliance_score, 100.0);
        assert!(score.safety_score < 100.0);
        // One penalized event at weight 2 of a possible 4: safety 50.
        assert_eq!(score.safety_score, 50.0);
        // Zero eco windows, zero aggressive events, denominator floored at 1.
        assert_eq!(score.efficiency_score, 0.0);
        // One smooth window against one harsh event.
        assert_eq!(score.smoothness_score, 50.0);
    }

    #[test]
    fn sub_scores_stay_clamped_for_empty_trips() {
        let start = Utc::now();
        let score = compute_trip_score(
            &[],
            TripStatistics::default(),
            start,
            start + Duration::minutes(1),
        );

        for s in [
            score.overall_score,
            score.safety_score,
            score.efficiency_score,
            score.smoothness_score,
            score.legal_compliance_score,
        ] {
            assert!((0.0..=100.0).contains(&s));
        }
        // Empty trips are neutral across the board.
        assert_eq!(score.overall_score, 100.0);
        assert!(score.risk_factors.is_empty());
    }

    #[test]
    fn safety_penalty_scales_with_severity_ordinal() {
        let start = Utc::now();
        let critical = vec![event(0, EventType::PhoneUsage, Severity::Critical)];
        let score = compute_trip_score(
            &critical,
            ten_minute_stats(),
            start,
            start + Duration::minutes(10),
        );
        // One Critical of one event: penalty 4/4, safety 0.
        assert_eq!(score.safety_score, 0.0);
    }

    #[test]
    fn speeding_time_erodes_legal_compliance() {
        let mut stats = ten_minute_stats();
        stats.speeding_duration_ms = 150_000; // a quarter of the trip
        let start = Utc::now();
        let events = vec![event(0, EventType::Speeding, Severity::High)];
        let score =
            compute_trip_score(&events, stats, start, start + Duration::minutes(10));
        assert_eq!(score.legal_compliance_score, 75.0);
    }

    #[test]
    fn risk_factors_respect_tolerances() {
        let start = Utc::now();

        // Three hard-braking events: inside tolerance, no factor.
        let tolerated: Vec<DrivingEvent> = (0..3)
            .map(|i| event(i * 1000, EventType::HardBraking, Severity::Medium))
            .collect();
        let score = compute_trip_score(
            &tolerated,
            ten_minute_stats(),
            start,
            start + Duration::minutes(10),
        );
        assert!(score.risk_factors.is_empty());

        // Five: two over tolerance, factor with negative points.
        let excessive: Vec<DrivingEvent> = (0..5)
            .map(|i| event(i * 1000, EventType::HardBraking, Severity::Medium))
            .collect();
        let score = compute_trip_score(
            &excessive,
            ten_minute_stats(),
            start,
            start + Duration::minutes(10),
        );
        let factor = score
            .risk_factors
            .iter()
            .find(|f| f.factor_type == RiskFactorType::FrequentHardBraking)
            .expect("factor present");
        assert_eq!(factor.occurrence_count, 5);
        assert!(factor.penalty_points < 0);

        // A single phone-usage event is enough for a distraction factor.
        let phone = vec![event(0, EventType::PhoneUsage, Severity::Medium)];
        let score = compute_trip_score(
            &phone,
            ten_minute_stats(),
            start,
            start + Duration::minutes(10),
        );
        assert!(score
            .risk_factors
            .iter()
            .any(|f| f.factor_type == RiskFactorType::PhoneDistraction));
    }
}
