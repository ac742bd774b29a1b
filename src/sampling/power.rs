// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Power-mode derivation and battery-life estimation

use serde::{Deserialize, Serialize};

use super::context::DrivingContext;
use crate::sources::{PowerTelemetry, ThermalState};

/// Battery level at or below which the device is considered low.
pub const LOW_BATTERY_PERCENT: f64 = 20.0;
/// Battery level at or below which the device is considered critical.
pub const CRITICAL_BATTERY_PERCENT: f64 = 10.0;

/// Operating mode derived from power telemetry and driving context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerMode {
    /// Full-fidelity sensing.
    Performance,
    /// Default trade-off.
    Balanced,
    /// Reduced sensing to stretch the battery.
    BatterySaver,
    /// Minimal sensing, battery nearly exhausted.
    CriticalBattery,
    /// Vehicle parked, sensing idled.
    DeepSleep,
}

/// Derived power state published to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerState {
    /// Battery charge, 0-100.
    pub battery_level: f64,
    /// True while on external power.
    pub is_charging: bool,
    /// True while the OS power-save mode is active.
    pub is_power_save_mode: bool,
    /// Thermal status.
    pub thermal_state: ThermalState,
    /// Derived operating mode.
    pub power_mode: PowerMode,
    /// Estimated minutes of battery left; `None` while charging.
    pub estimated_battery_life_minutes: Option<f64>,
    /// Milliseconds on the telemetry stream's monotonic clock.
    pub timestamp_ms: u64,
}

/// Derive the power mode. Priority-ordered; the first matching rule wins.
pub fn derive_power_mode(telemetry: &PowerTelemetry, context: DrivingContext) -> PowerMode {
    let battery = telemetry.battery_level;

    if (battery <= CRITICAL_BATTERY_PERCENT && !telemetry.is_charging)
        || telemetry.thermal_state == ThermalState::Critical
    {
        return PowerMode::CriticalBattery;
    }
    if context == DrivingContext::Parked {
        return PowerMode::DeepSleep;
    }
    if (battery <= LOW_BATTERY_PERCENT && !telemetry.is_charging)
        || telemetry.is_power_save_mode
        || telemetry.thermal_state == ThermalState::Hot
    {
        return PowerMode::BatterySaver;
    }
    if (telemetry.is_charging && battery > 50.0)
        || (battery > 80.0 && telemetry.thermal_state == ThermalState::Normal)
    {
        return PowerMode::Performance;
    }
    PowerMode::Balanced
}

/// Expected hourly battery drain for a driving context, in percent per hour.
pub fn hourly_drain_percent(context: DrivingContext) -> f64 {
    match context {
        DrivingContext::Parked => 1.0,
        DrivingContext::HighwayDriving => 8.0,
        DrivingContext::CityDriving | DrivingContext::StopAndGo => 12.0,
        DrivingContext::Unknown => 10.0,
    }
}

/// Estimated minutes of battery left, unbounded (`None`) while charging.
pub fn estimate_battery_life_minutes(
    telemetry: &PowerTelemetry,
    context: DrivingContext,
) -> Option<f64> {
    if telemetry.is_charging {
        return None;
    }
    Some(telemetry.battery_level / hourly_drain_percent(context) * 60.0)
}

/// Assemble the published [`PowerState`] from telemetry and context.
pub fn build_power_state(telemetry: &PowerTelemetry, context: DrivingContext) -> PowerState {
    PowerState {
        battery_level: telemetry.battery_level,
        is_charging: telemetry.is_charging,
        is_power_save_mode: telemetry.is_power_save_mode,
        thermal_state: telemetry.thermal_state,
        power_mode: derive_power_mode(telemetry, context),
        estimated_battery_life_minutes: estimate_battery_life_minutes(telemetry, context),
        timestamp_ms: telemetry.timestamp_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telemetry(battery: f64, charging: bool) -> PowerTelemetry {
        PowerTelemetry {
            battery_level: battery,
            is_charging: charging,
            is_power_save_mode: false,
            thermal_state: ThermalState::Normal,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn critical_battery_wins_over_any_context() {
        let t = telemetry(8.0, false);
        assert_eq!(
            derive_power_mode(&t, DrivingContext::HighwayDriving),
            PowerMode::CriticalBattery
        );
        assert_eq!(
            derive_power_mode(&t, DrivingContext::Parked),
            PowerMode::CriticalBattery
        );
    }

    #[test]
    fn thermal_critical_forces_critical_mode_even_while_charging() {
        let mut t = telemetry(90.0, true);
        t.thermal_state = ThermalState::Critical;
        assert_eq!(
            derive_power_mode(&t, DrivingContext::CityDriving),
            PowerMode::CriticalBattery
        );
    }

    #[test]
    fn parked_maps_to_deep_sleep_above_critical() {
        let t = telemetry(55.0, false);
        assert_eq!(
            derive_power_mode(&t, DrivingContext::Parked),
            PowerMode::DeepSleep
        );
    }

    #[test]
    fn saver_performance_and_balanced_tiers() {
        assert_eq!(
            derive_power_mode(&telemetry(15.0, false), DrivingContext::CityDriving),
            PowerMode::BatterySaver
        );
        assert_eq!(
            derive_power_mode(&telemetry(60.0, true), DrivingContext::CityDriving),
            PowerMode::Performance
        );
        assert_eq!(
            derive_power_mode(&telemetry(85.0, false), DrivingContext::CityDriving),
            PowerMode::Performance
        );
        assert_eq!(
            derive_power_mode(&telemetry(45.0, false), DrivingContext::CityDriving),
            PowerMode::Balanced
        );
    }

    #[test]
    fn power_save_flag_forces_saver() {
        let mut t = telemetry(85.0, false);
        t.is_power_save_mode = true;
        assert_eq!(
            derive_power_mode(&t, DrivingContext::CityDriving),
            PowerMode::BatterySaver
        );
    }

    #[test]
    fn battery_life_uses_context_drain_and_is_unbounded_while_charging() {
        let t = telemetry(50.0, false);
        // 50% at 1%/h parked: 50 hours.
        assert_eq!(
            estimate_battery_life_minutes(&t, DrivingContext::Parked),
            Some(3000.0)
        );
        // 50% at 12%/h in the city: 250 minutes.
        assert_eq!(
            estimate_battery_life_minutes(&t, DrivingContext::CityDriving),
            Some(250.0)
        );

        assert_eq!(
            estimate_battery_life_minutes(&telemetry(50.0, true), DrivingContext::CityDriving),
            None
        );
    }
}
