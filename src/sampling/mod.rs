//! Adaptive sampling - driving context, power mode, sampling strategy

mod context;
mod power;
mod strategy;

pub use context::*;
pub use power::*;
pub use strategy::*;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::SamplingConfig;
use crate::core::EventBus;
use crate::sources::{LocationSample, PowerSource, PowerTelemetry};

/// Balances data fidelity against battery consumption.
///
/// Classifies the driving context from its own rolling speed history,
/// derives a power mode from device telemetry, and emits a
/// [`SamplingStrategy`] the raw-sample producers use to throttle
/// themselves. Recomputes on a fixed cadence; a slower battery monitor
/// triggers the only out-of-cycle recomputes (a sharp drop or a
/// low/critical threshold crossing).
pub struct AdaptiveSamplingController {
    config: SamplingConfig,
    power_source: Arc<dyn PowerSource>,
    bus: Arc<EventBus>,
    inner: Mutex<ControllerState>,
}

struct ControllerState {
    context: ContextClassifier,
    last_power_state: Option<PowerState>,
    last_context: Option<DrivingContext>,
    last_strategy: Option<SamplingStrategy>,
    monitor_battery_level: Option<f64>,
}

/// Equality net of the telemetry timestamp, so an unchanged power state is
/// not republished every recompute cadence.
fn same_power_state(a: &PowerState, b: &PowerState) -> bool {
    a.battery_level == b.battery_level
        && a.is_charging == b.is_charging
        && a.is_power_save_mode == b.is_power_save_mode
        && a.thermal_state == b.thermal_state
        && a.power_mode == b.power_mode
        && a.estimated_battery_life_minutes == b.estimated_battery_life_minutes
}

impl AdaptiveSamplingController {
    /// Create a controller reading power telemetry from `power_source`.
    pub fn new(
        config: SamplingConfig,
        power_source: Arc<dyn PowerSource>,
        bus: Arc<EventBus>,
    ) -> Self {
        let state = ControllerState {
            context: ContextClassifier::new(config.clone()),
            last_power_state: None,
            last_context: None,
            last_strategy: None,
            monitor_battery_level: None,
        };
        Self {
            config,
            power_source,
            bus,
            inner: Mutex::new(state),
        }
    }

    /// Feed a location fix into the controller's own speed history.
    pub fn update_location(&self, fix: &LocationSample) {
        if let Some(speed) = fix.speed_mps {
            self.inner.lock().context.observe(fix.timestamp_ms, speed);
        }
    }

    /// Recompute context, power state, and strategy from fresh telemetry.
    ///
    /// Returns the current strategy; changed values are published on the bus.
    pub fn recompute(&self, telemetry: PowerTelemetry) -> SamplingStrategy {
        let (power_update, context_update, strategy_update, strategy) = {
            let mut state = self.inner.lock();

            let context = state.context.classify();
            let power_state = build_power_state(&telemetry, context);
            let strategy =
                strategy_for(power_state.power_mode, context, telemetry.battery_level);

            let power_changed = !state
                .last_power_state
                .as_ref()
                .map(|p| same_power_state(p, &power_state))
                .unwrap_or(false);
            let context_changed = state.last_context != Some(context);
            let strategy_changed = state.last_strategy.as_ref() != Some(&strategy);

            state.last_power_state = Some(power_state);
            state.last_context = Some(context);
            state.last_strategy = Some(strategy.clone());

            (
                power_changed.then_some(power_state),
                context_changed.then_some(context),
                strategy_changed.then(|| strategy.clone()),
                strategy,
            )
        };

        if let Some(power_state) = power_update {
            self.bus.publish_power_state(power_state);
        }
        if let Some(context) = context_update {
            self.bus.publish_context(context);
        }
        if let Some(changed) = strategy_update {
            info!(
                interval_ms = changed.location_interval_ms,
                reason = %changed.reason,
                "sampling strategy updated"
            );
            self.bus.publish_strategy(changed);
        }
        strategy
    }

    /// Whether the battery monitor observed a trigger for an out-of-cycle
    /// recompute: a drop of at least the configured step, or a crossing of
    /// the low/critical thresholds.
    fn battery_trigger(&self, telemetry: &PowerTelemetry) -> bool {
        let mut state = self.inner.lock();
        let previous = state.monitor_battery_level.replace(telemetry.battery_level);
        let Some(previous) = previous else {
            return false;
        };

        let level = telemetry.battery_level;
        let dropped = previous - level >= self.config.battery_drop_trigger_percent;
        let crossed_low = previous > LOW_BATTERY_PERCENT && level <= LOW_BATTERY_PERCENT;
        let crossed_critical =
            previous > CRITICAL_BATTERY_PERCENT && level <= CRITICAL_BATTERY_PERCENT;

        if dropped || crossed_low || crossed_critical {
            debug!(previous, level, "battery monitor triggered recompute");
            true
        } else {
            false
        }
    }

    /// Periodic task: strategy recompute cadence plus the battery monitor.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> anyhow::Result<()> {
        info!("Starting adaptive sampling controller...");

        let mut location_rx = self.bus.subscribe_locations();
        let mut recompute_tick =
            interval(Duration::from_millis(self.config.recompute_interval_ms));
        let mut monitor_tick =
            interval(Duration::from_millis(self.config.monitor_interval_ms));

        loop {
            tokio::select! {
                Ok(fix) = location_rx.recv() => {
                    self.update_location(&fix);
                }
                _ = recompute_tick.tick() => {
                    match self.power_source.read().await {
                        Ok(telemetry) => {
                            self.recompute(telemetry);
                        }
                        Err(e) => warn!("Power telemetry read failed: {}", e),
                    }
                }
                _ = monitor_tick.tick() => {
                    match self.power_source.read().await {
                        Ok(telemetry) => {
                            if self.battery_trigger(&telemetry) {
                                self.recompute(telemetry);
                            }
                        }
                        Err(e) => warn!("Power telemetry read failed: {}", e),
                    }
                }
                _ = shutdown.recv() => {
                    info!("Adaptive sampling controller shutting down...");
                    break;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ThermalState;

    struct FixedPower(PowerTelemetry);

    #[async_trait::async_trait]
    impl PowerSource for FixedPower {
        async fn read(&self) -> anyhow::Result<PowerTelemetry> {
            Ok(self.0)
        }
    }

    fn telemetry(battery: f64, charging: bool) -> PowerTelemetry {
        PowerTelemetry {
            battery_level: battery,
            is_charging: charging,
            is_power_save_mode: false,
            thermal_state: ThermalState::Normal,
            timestamp_ms: 0,
        }
    }

    fn controller(battery: f64) -> AdaptiveSamplingController {
        AdaptiveSamplingController::new(
            SamplingConfig::default(),
            Arc::new(FixedPower(telemetry(battery, false))),
            Arc::new(EventBus::new(64)),
        )
    }

    #[test]
    fn critical_battery_yields_minimal_strategy_regardless_of_context() {
        let c = controller(8.0);
        // Feed a highway-looking speed history.
        for i in 0..60u64 {
            c.update_location(&LocationSample {
                latitude: -1.25,
                longitude: 36.80,
                altitude: 1700.0,
                speed_mps: Some(27.0),
                accuracy_m: 5.0,
                bearing_deg: 90.0,
                timestamp_ms: i * 1000,
            });
        }

        let strategy = c.recompute(telemetry(8.0, false));
        assert_eq!(
            strategy.enabled_sensors,
            vec![crate::sources::SensorKind::Accelerometer]
        );
    }

    #[test]
    fn battery_monitor_triggers_on_sharp_drop() {
        let c = controller(90.0);

        // First observation only seeds the monitor.
        assert!(!c.battery_trigger(&telemetry(90.0, false)));
        // 3% drop: below the 5% trigger.
        assert!(!c.battery_trigger(&telemetry(87.0, false)));
        // 6% drop: triggers.
        assert!(c.battery_trigger(&telemetry(81.0, false)));
    }

    #[test]
    fn battery_monitor_triggers_on_threshold_crossings() {
        // Crossing the low threshold triggers even on a small drop.
        let c = controller(22.0);
        assert!(!c.battery_trigger(&telemetry(22.0, false)));
        assert!(!c.battery_trigger(&telemetry(21.0, false)));
        assert!(c.battery_trigger(&telemetry(19.5, false)));

        // Crossing the critical threshold.
        let c = controller(12.0);
        assert!(!c.battery_trigger(&telemetry(12.0, false)));
        assert!(!c.battery_trigger(&telemetry(11.0, false)));
        assert!(c.battery_trigger(&telemetry(9.9, false)));
    }

    #[test]
    fn strategy_is_republished_only_on_change() {
        let c = controller(60.0);
        let bus = c.bus.clone();
        let mut strategy_rx = bus.subscribe_strategies();

        c.recompute(telemetry(60.0, false));
        c.recompute(telemetry(60.0, false));

        // Exactly one strategy on the bus for two identical recomputes.
        assert!(strategy_rx.try_recv().is_ok());
        assert!(strategy_rx.try_recv().is_err());
    }
}
