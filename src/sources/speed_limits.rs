// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Speed-limit and road-type lookup boundary
//!
//! The real collaborator is a map/geofence service; the core only sees this
//! trait. A lookup miss is the normal "unknown road" case, not an error;
//! the speeding detector abstains for that tick.

use serde::{Deserialize, Serialize};

/// Coarse road classification used to scale speeding thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoadType {
    /// Urban residential streets.
    Residential,
    /// Major urban arterials.
    Arterial,
    /// Highways and expressways.
    Highway,
}

/// Posted limit and road type for a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimitInfo {
    /// Posted limit in km/h.
    pub limit_kmh: f64,
    /// Road classification.
    pub road_type: RoadType,
}

/// Lookup keyed by location. `None` means the road is unknown.
pub trait SpeedLimitSource: Send + Sync {
    /// Posted limit and road type at the given coordinates, if known.
    fn lookup(&self, latitude: f64, longitude: f64) -> Option<SpeedLimitInfo>;
}

/// A rectangular geofence carrying a posted limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimitZone {
    /// Southern boundary, degrees north.
    pub min_latitude: f64,
    /// Northern boundary, degrees north.
    pub max_latitude: f64,
    /// Western boundary, degrees east.
    pub min_longitude: f64,
    /// Eastern boundary, degrees east.
    pub max_longitude: f64,
    /// Limit and road type inside the zone.
    pub info: SpeedLimitInfo,
}

impl SpeedLimitZone {
    fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }
}

/// Static geofence table, first matching zone wins.
///
/// Stands in for the map service in tests and demos; production deployments
/// implement [`SpeedLimitSource`] against a real provider.
#[derive(Debug, Clone, Default)]
pub struct StaticSpeedLimitSource {
    zones: Vec<SpeedLimitZone>,
}

impl StaticSpeedLimitSource {
    /// Build a table from explicit zones.
    pub fn new(zones: Vec<SpeedLimitZone>) -> Self {
        Self { zones }
    }

    /// Add a zone after construction.
    pub fn add_zone(&mut self, zone: SpeedLimitZone) {
        self.zones.push(zone);
    }
}

impl SpeedLimitSource for StaticSpeedLimitSource {
    fn lookup(&self, latitude: f64, longitude: f64) -> Option<SpeedLimitInfo> {
        self.zones
            .iter()
            .find(|z| z.contains(latitude, longitude))
            .map(|z| z.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urban_zone() -> SpeedLimitZone {
        SpeedLimitZone {
            min_latitude: -1.30,
            max_latitude: -1.20,
            min_longitude: 36.75,
            max_longitude: 36.90,
            info: SpeedLimitInfo {
                limit_kmh: 50.0,
                road_type: RoadType::Residential,
            },
        }
    }

    #[test]
    fn lookup_hits_inside_zone_and_misses_outside() {
        let source = StaticSpeedLimitSource::new(vec![urban_zone()]);

        let hit = source.lookup(-1.25, 36.80).unwrap();
        assert_eq!(hit.limit_kmh, 50.0);
        assert_eq!(hit.road_type, RoadType::Residential);

        assert!(source.lookup(0.0, 0.0).is_none());
    }
}
