// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Event bus for inter-component communication
//!
//! One-way push over broadcast channels: a producer posts a value, every
//! subscriber buffers it independently. Consumers observe each stream in
//! emission order; a slow consumer lags and drops oldest first rather than
//! exerting back-pressure on the producer.

use tokio::sync::broadcast;

use crate::detection::{DrivingEvent, TripScore};
use crate::motion::MotionSnapshot;
use crate::sampling::{DrivingContext, PowerState, SamplingStrategy};
use crate::sources::{LocationSample, RawSensorSample};

/// Central pub/sub hub for all core streams.
pub struct EventBus {
    raw_tx: broadcast::Sender<RawSensorSample>,
    location_tx: broadcast::Sender<LocationSample>,
    snapshot_tx: broadcast::Sender<MotionSnapshot>,
    event_tx: broadcast::Sender<DrivingEvent>,
    score_tx: broadcast::Sender<TripScore>,
    power_tx: broadcast::Sender<PowerState>,
    context_tx: broadcast::Sender<DrivingContext>,
    strategy_tx: broadcast::Sender<SamplingStrategy>,
}

impl EventBus {
    /// Create a bus whose channels each buffer `capacity` values.
    pub fn new(capacity: usize) -> Self {
        let (raw_tx, _) = broadcast::channel(capacity);
        let (location_tx, _) = broadcast::channel(capacity);
        let (snapshot_tx, _) = broadcast::channel(capacity);
        let (event_tx, _) = broadcast::channel(capacity);
        let (score_tx, _) = broadcast::channel(capacity);
        let (power_tx, _) = broadcast::channel(capacity);
        let (context_tx, _) = broadcast::channel(capacity);
        let (strategy_tx, _) = broadcast::channel(capacity);

        Self {
            raw_tx,
            location_tx,
            snapshot_tx,
            event_tx,
            score_tx,
            power_tx,
            context_tx,
            strategy_tx,
        }
    }

    /// Publish a raw tri-axis sensor sample.
    pub fn publish_raw_sample(&self, sample: RawSensorSample) {
        let _ = self.raw_tx.send(sample);
    }

    /// Publish a location fix.
    pub fn publish_location(&self, fix: LocationSample) {
        let _ = self.location_tx.send(fix);
    }

    /// Publish a motion snapshot.
    pub fn publish_snapshot(&self, snapshot: MotionSnapshot) {
        let _ = self.snapshot_tx.send(snapshot);
    }

    /// Publish a driving event.
    pub fn publish_event(&self, event: DrivingEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Publish a finalized trip score.
    pub fn publish_score(&self, score: TripScore) {
        let _ = self.score_tx.send(score);
    }

    /// Publish a derived power state.
    pub fn publish_power_state(&self, state: PowerState) {
        let _ = self.power_tx.send(state);
    }

    /// Publish a driving-context change.
    pub fn publish_context(&self, context: DrivingContext) {
        let _ = self.context_tx.send(context);
    }

    /// Publish a sampling-strategy update.
    pub fn publish_strategy(&self, strategy: SamplingStrategy) {
        let _ = self.strategy_tx.send(strategy);
    }

    /// Subscribe to raw tri-axis sensor samples.
    pub fn subscribe_raw_samples(&self) -> broadcast::Receiver<RawSensorSample> {
        self.raw_tx.subscribe()
    }

    /// Subscribe to location fixes.
    pub fn subscribe_locations(&self) -> broadcast::Receiver<LocationSample> {
        self.location_tx.subscribe()
    }

    /// Subscribe to motion snapshots.
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<MotionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to driving events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<DrivingEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to finalized trip scores.
    pub fn subscribe_scores(&self) -> broadcast::Receiver<TripScore> {
        self.score_tx.subscribe()
    }

    /// Subscribe to derived power states.
    pub fn subscribe_power_states(&self) -> broadcast::Receiver<PowerState> {
        self.power_tx.subscribe()
    }

    /// Subscribe to driving-context changes.
    pub fn subscribe_contexts(&self) -> broadcast::Receiver<DrivingContext> {
        self.context_tx.subscribe()
    }

    /// Subscribe to sampling-strategy updates.
    pub fn subscribe_strategies(&self) -> broadcast::Receiver<SamplingStrategy> {
        self.strategy_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SensorKind;

    #[test]
    fn subscribers_see_samples_in_emission_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe_raw_samples();

        for i in 0..5u64 {
            bus.publish_raw_sample(RawSensorSample::new(
                SensorKind::Accelerometer,
                i,
                0.0,
                0.0,
                9.81,
            ));
        }

        for i in 0..5u64 {
            assert_eq!(rx.try_recv().unwrap().timestamp_ms, i);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new(4);
        bus.publish_context(DrivingContext::CityDriving);
    }
}
