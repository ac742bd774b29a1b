// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Speeding detector - road-type-aware excess thresholds
//!
//! Limits and road types come from the injected map/geofence collaborator.
//! When the lookup misses, the detector abstains for the tick. The default
//! tables are calibrated for Kenyan roads but every threshold is injected
//! through configuration, so any jurisdiction can be described.

use serde::{Deserialize, Serialize};

use super::Severity;
use crate::sources::{RoadType, SpeedLimitInfo};

/// Excess thresholds (km/h over the posted limit) for one road type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedingThresholds {
    /// Minor excess: first severity tier.
    pub minor_kmh: f64,
    /// Major excess: second tier.
    pub major_kmh: f64,
    /// Excessive: top tier.
    pub excessive_kmh: f64,
}

/// Per-road-type excess tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedingTable {
    /// Urban residential streets.
    pub residential: SpeedingThresholds,
    /// Major urban arterials.
    pub arterial: SpeedingThresholds,
    /// Highways and expressways.
    pub highway: SpeedingThresholds,
}

impl Default for SpeedingTable {
    fn default() -> Self {
        Self {
            residential: SpeedingThresholds {
                minor_kmh: 12.0,
                major_kmh: 20.0,
                excessive_kmh: 30.0,
            },
            arterial: SpeedingThresholds {
                minor_kmh: 15.0,
                major_kmh: 25.0,
                excessive_kmh: 35.0,
            },
            highway: SpeedingThresholds {
                minor_kmh: 20.0,
                major_kmh: 30.0,
                excessive_kmh: 40.0,
            },
        }
    }
}

impl SpeedingTable {
    /// Thresholds for a road type.
    pub fn for_road(&self, road_type: RoadType) -> SpeedingThresholds {
        match road_type {
            RoadType::Residential => self.residential,
            RoadType::Arterial => self.arterial,
            RoadType::Highway => self.highway,
        }
    }
}

/// A speeding hit: severity plus the excess over the posted limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedingFinding {
    /// Tiered severity.
    pub severity: Severity,
    /// Excess over the posted limit in km/h.
    pub excess_kmh: f64,
    /// GPS-derived speed: fixed confidence.
    pub confidence: f64,
}

/// Confidence for GPS-derived speeding findings.
pub const SPEEDING_CONFIDENCE: f64 = 0.9;

/// Classify the current speed against the posted limit, or abstain when the
/// excess sits below the road type's minor threshold.
pub fn classify_speeding(
    speed_kmh: f64,
    limit: &SpeedLimitInfo,
    table: &SpeedingTable,
) -> Option<SpeedingFinding> {
    let excess = speed_kmh - limit.limit_kmh;
    let thresholds = table.for_road(limit.road_type);

    let severity = if excess >= thresholds.excessive_kmh {
        Severity::Critical
    } else if excess >= thresholds.major_kmh {
        Severity::High
    } else if excess >= thresholds.minor_kmh {
        Severity::Medium
    } else {
        return None;
    };

    Some(SpeedingFinding {
        severity,
        excess_kmh: excess,
        confidence: SPEEDING_CONFIDENCE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(limit_kmh: f64, road_type: RoadType) -> SpeedLimitInfo {
        SpeedLimitInfo {
            limit_kmh,
            road_type,
        }
    }

    #[test]
    fn identical_excess_is_harsher_on_urban_roads() {
        let table = SpeedingTable::default();

        // 15 km/h over a 50 km/h residential limit: Medium.
        let urban = classify_speeding(65.0, &limit(50.0, RoadType::Residential), &table);
        assert_eq!(urban.map(|f| f.severity), Some(Severity::Medium));

        // The same 15 km/h over a 100 km/h highway limit: no event at all.
        let highway = classify_speeding(115.0, &limit(100.0, RoadType::Highway), &table);
        assert!(highway.is_none());
    }

    #[test]
    fn tiers_escalate_with_excess() {
        let table = SpeedingTable::default();
        let residential = limit(50.0, RoadType::Residential);

        let cases = [
            (55.0, None),
            (62.0, Some(Severity::Medium)),
            (70.0, Some(Severity::High)),
            (80.0, Some(Severity::Critical)),
        ];
        for (speed, expected) in cases {
            let finding = classify_speeding(speed, &residential, &table);
            assert_eq!(finding.map(|f| f.severity), expected, "{} km/h", speed);
        }
    }

    #[test]
    fn confidence_is_fixed_for_gps_speeds() {
        let table = SpeedingTable::default();
        let finding =
            classify_speeding(75.0, &limit(50.0, RoadType::Residential), &table).unwrap();
        assert_eq!(finding.confidence, SPEEDING_CONFIDENCE);
    }
}
