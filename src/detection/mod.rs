//! Driving event detection - per-trip event stream and trip scoring

mod kinematics;
mod patterns;
mod phone;
mod scoring;
mod speeding;

pub use kinematics::*;
pub use patterns::*;
pub use phone::*;
pub use scoring::*;
pub use speeding::*;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::core::{EventBus, SampleBuffer};
use crate::motion::MotionSnapshot;
use crate::sources::{LocationSample, RoadType, SpeedLimitSource};

/// Discrete driving event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Deceleration past the braking threshold.
    HardBraking,
    /// Acceleration past the symmetric positive threshold.
    RapidAcceleration,
    /// Lateral acceleration past the cornering threshold.
    HarshCornering,
    /// Speed above the posted limit by a road-type-scaled excess.
    Speeding,
    /// Fused phone-usage probability above the emit threshold.
    PhoneUsage,
    /// Clustered harsh events within the pattern window.
    AggressiveDriving,
    /// A pattern window without harsh events while moving.
    SmoothDriving,
    /// A pattern window dominated by gentle accelerations.
    EcoDriving,
}

/// Tiered severity; the ordinal doubles as the penalty weight in scoring.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// Noteworthy.
    Low,
    /// Meaningful.
    Medium,
    /// Serious.
    High,
    /// Dangerous.
    Critical,
}

impl Severity {
    /// Integer penalty weight (Low=1 .. Critical=4).
    pub fn penalty_weight(&self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }
}

/// Coarse time-of-day bucket for event context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    /// 06:00-12:00.
    Morning,
    /// 12:00-17:00.
    Afternoon,
    /// 17:00-20:00.
    Evening,
    /// 20:00-06:00.
    Night,
}

impl TimeOfDay {
    /// Bucket for an hour of day.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=19 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

/// Best-effort situational context attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    /// Road classification at the event location, when known.
    pub road_type: Option<RoadType>,
    /// Time-of-day bucket.
    pub time_of_day: Option<TimeOfDay>,
    /// Weather description, when a provider supplies one.
    pub weather: Option<String>,
    /// Traffic description, when a provider supplies one.
    pub traffic: Option<String>,
}

/// One detected driving event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivingEvent {
    /// Unique event id.
    pub id: String,
    /// Event category.
    pub event_type: EventType,
    /// Tiered severity.
    pub severity: Severity,
    /// Milliseconds on the trip's monotonic clock.
    pub timestamp_ms: u64,
    /// Wall-clock time the event was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Latitude at the event, when a fix was available.
    pub latitude: Option<f64>,
    /// Longitude at the event, when a fix was available.
    pub longitude: Option<f64>,
    /// Speed at the event in m/s, when known.
    pub speed_mps: Option<f64>,
    /// Event-specific physical magnitude.
    pub magnitude: f64,
    /// Time spanned by the detection window.
    pub duration_ms: u64,
    /// Detector confidence, 0-1.
    pub confidence: f64,
    /// Best-effort context; `None` when nothing could be resolved.
    pub context: Option<EventContext>,
}

/// Detects discrete driving events and scores completed trips.
///
/// Owns the open trip's event list and buffers exclusively; everything is
/// cleared when the trip stops. Buffer writes and analysis ticks are
/// serialized on one mutex, and the finalize-on-stop step runs at most once
/// because stopping takes the whole trip state out of the detector.
pub struct DrivingEventDetector {
    config: DetectionConfig,
    speed_limits: Arc<dyn SpeedLimitSource>,
    bus: Arc<EventBus>,
    inner: Mutex<Option<TripState>>,
}

struct TripState {
    started_at: DateTime<Utc>,
    events: Vec<DrivingEvent>,
    snapshots: SampleBuffer<MotionSnapshot>,
    speeds: SampleBuffer<f64>,
    last_location: Option<LocationSample>,
    distance_m: f64,
    speeding_ms: u64,
    idle_ms: u64,
    max_speed_mps: f64,
    speed_sum_mps: f64,
    speed_count: u64,
    last_tick_ms: Option<u64>,
    last_emitted: HashMap<EventType, u64>,
    first_sample_ms: Option<u64>,
    last_sample_ms: Option<u64>,
}

impl TripState {
    fn new(started_at: DateTime<Utc>, buffer_capacity: usize) -> Self {
        Self {
            started_at,
            events: Vec::new(),
            snapshots: SampleBuffer::new(buffer_capacity),
            speeds: SampleBuffer::new(buffer_capacity),
            last_location: None,
            distance_m: 0.0,
            speeding_ms: 0,
            idle_ms: 0,
            max_speed_mps: 0.0,
            speed_sum_mps: 0.0,
            speed_count: 0,
            last_tick_ms: None,
            last_emitted: HashMap::new(),
            first_sample_ms: None,
            last_sample_ms: None,
        }
    }

    fn observe_timestamp(&mut self, timestamp_ms: u64) {
        self.first_sample_ms.get_or_insert(timestamp_ms);
        self.last_sample_ms = Some(
            self.last_sample_ms
                .map(|t| t.max(timestamp_ms))
                .unwrap_or(timestamp_ms),
        );
    }

    fn now_ms(&self) -> Option<u64> {
        self.speeds
            .latest_timestamp()
            .into_iter()
            .chain(self.snapshots.latest_timestamp())
            .max()
    }
}

impl DrivingEventDetector {
    /// Create a detector resolving speed limits through `speed_limits`.
    pub fn new(
        config: DetectionConfig,
        speed_limits: Arc<dyn SpeedLimitSource>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            config,
            speed_limits,
            bus,
            inner: Mutex::new(None),
        }
    }

    /// Open a trip, resetting all trip state. Idempotent while running.
    pub fn start_event_detection(&self) {
        let mut inner = self.inner.lock();
        if inner.is_some() {
            debug!("Trip already open, start ignored");
            return;
        }
        *inner = Some(TripState::new(Utc::now(), self.config.buffer_capacity));
        info!("Trip started");
    }

    /// True while a trip is open.
    pub fn is_running(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Buffer a motion snapshot for the open trip.
    pub fn update_motion(&self, snapshot: &MotionSnapshot) {
        let mut inner = self.inner.lock();
        let Some(state) = inner.as_mut() else {
            return;
        };
        if let Err(e) = state.snapshots.push(snapshot.timestamp_ms, *snapshot) {
            debug!("Dropped snapshot: {}", e);
        } else {
            state.observe_timestamp(snapshot.timestamp_ms);
        }
    }

    /// Buffer a location fix for the open trip and accumulate trip distance.
    pub fn update_location(&self, fix: &LocationSample) {
        if !fix.is_finite() {
            debug!("Dropped malformed location fix");
            return;
        }

        let mut inner = self.inner.lock();
        let Some(state) = inner.as_mut() else {
            return;
        };

        if let Some(previous) = &state.last_location {
            if fix.timestamp_ms < previous.timestamp_ms {
                debug!("Dropped regressed location fix");
                return;
            }
            state.distance_m += previous.distance_m(fix);

            let dt = fix.timestamp_ms - previous.timestamp_ms;
            let idle = fix
                .speed_mps
                .map(|s| s < self.config.movement_threshold_mps)
                .unwrap_or(false);
            if idle {
                state.idle_ms += dt;
            }
        }

        if let Some(speed) = fix.speed_mps {
            if state.speeds.push(fix.timestamp_ms, speed).is_ok() {
                state.max_speed_mps = state.max_speed_mps.max(speed);
                state.speed_sum_mps += speed;
                state.speed_count += 1;
            }
        }
        state.observe_timestamp(fix.timestamp_ms);
        state.last_location = Some(*fix);
    }

    /// Run the per-tick detectors over the analysis window.
    ///
    /// Each detector abstains when its window is short on samples or its
    /// external context is missing; abstention is the default outcome, not
    /// an error. The aggressive-driving pass consumes the events the other
    /// detectors recorded and therefore runs last in the tick.
    pub fn analyze_events(&self) {
        let emitted = {
            let mut inner = self.inner.lock();
            let Some(state) = inner.as_mut() else {
                return;
            };
            let Some(now) = state.now_ms() else {
                return;
            };

            let mut emitted: Vec<DrivingEvent> = Vec::new();
            let speed_window = state.speeds.window_ms(self.config.analysis_window_ms);
            let snapshot_window =
                state.snapshots.window_ms(self.config.analysis_window_ms);

            // Hard braking.
            if self.off_cooldown(state, EventType::HardBraking, now) {
                if let Some(finding) = detect_hard_braking(&speed_window, &self.config) {
                    emitted.push(self.record(
                        state,
                        EventType::HardBraking,
                        finding.severity,
                        now,
                        finding.magnitude,
                        finding.duration_ms,
                        finding.confidence,
                    ));
                }
            }

            // Rapid acceleration.
            if self.off_cooldown(state, EventType::RapidAcceleration, now) {
                if let Some(finding) =
                    detect_rapid_acceleration(&speed_window, &self.config)
                {
                    emitted.push(self.record(
                        state,
                        EventType::RapidAcceleration,
                        finding.severity,
                        now,
                        finding.magnitude,
                        finding.duration_ms,
                        finding.confidence,
                    ));
                }
            }

            // Harsh cornering: peak angular velocity over the window times
            // current speed. Sample-count gating rides on the speed stream;
            // snapshots arrive too slowly to carry it.
            if self.off_cooldown(state, EventType::HarshCornering, now)
                && speed_window.len() >= self.config.min_samples
            {
                let peak_gyro = snapshot_window
                    .iter()
                    .map(|s| s.value.gyroscope_magnitude)
                    .fold(0.0f64, f64::max);
                let speed = speed_window.last().map(|s| s.value).unwrap_or(0.0);
                if let Some(finding) = detect_harsh_cornering(
                    peak_gyro,
                    speed,
                    self.config.analysis_window_ms,
                    &self.config,
                ) {
                    emitted.push(self.record(
                        state,
                        EventType::HarshCornering,
                        finding.severity,
                        now,
                        finding.magnitude,
                        finding.duration_ms,
                        finding.confidence,
                    ));
                }
            }

            // Speeding: abstains whenever the limit lookup misses.
            self.analyze_speeding(state, &speed_window, now, &mut emitted);

            // Phone usage over the trip's recent pattern window.
            if self.off_cooldown(state, EventType::PhoneUsage, now) {
                let pattern_snapshots =
                    state.snapshots.window_ms(self.config.pattern_window_ms);
                let pattern_speeds =
                    state.speeds.window_ms(self.config.pattern_window_ms);
                if pattern_snapshots.len() >= self.config.min_samples {
                    let scores = score_pattern_window(
                        &pattern_snapshots,
                        &pattern_speeds,
                        &self.config.phone,
                    );
                    let fused = scores.fused(&self.config.phone);
                    if let Some(severity) =
                        classify_phone_usage(fused, &self.config.phone)
                    {
                        emitted.push(self.record(
                            state,
                            EventType::PhoneUsage,
                            severity,
                            now,
                            fused,
                            self.config.pattern_window_ms,
                            fused,
                        ));
                    }
                }
            }

            // Aggressive driving: consumes this detector's own output, so it
            // must run after everything above within the same tick.
            if self.off_cooldown(state, EventType::AggressiveDriving, now) {
                if let Some(count) = detect_aggressive_driving(
                    &state.events,
                    now,
                    self.config.pattern_window_ms,
                    self.config.aggressive_min_events,
                ) {
                    emitted.push(self.record(
                        state,
                        EventType::AggressiveDriving,
                        Severity::High,
                        now,
                        count as f64,
                        self.config.pattern_window_ms,
                        self.config.aggressive_confidence,
                    ));
                }
            }

            state.last_tick_ms = Some(now);
            emitted
        };

        for event in emitted {
            self.bus.publish_event(event);
        }
    }

    fn analyze_speeding(
        &self,
        state: &mut TripState,
        speed_window: &[crate::core::TimestampedSample<f64>],
        now: u64,
        emitted: &mut Vec<DrivingEvent>,
    ) {
        if speed_window.len() < self.config.min_samples {
            return;
        }
        let Some(fix) = state.last_location else {
            return;
        };
        let Some(speed) = fix.speed_mps else {
            return;
        };
        let Some(limit) = self.speed_limits.lookup(fix.latitude, fix.longitude) else {
            // Unknown road: abstain for this tick.
            return;
        };

        let finding = classify_speeding(speed * 3.6, &limit, &self.config.speeding);
        if let Some(finding) = finding {
            // Any tick spent over the limit counts toward speeding duration,
            // whether or not a fresh event is emitted.
            let tick = now
                .saturating_sub(state.last_tick_ms.unwrap_or(now))
                .min(self.config.tick_interval_ms * 4);
            state.speeding_ms += tick;

            if self.off_cooldown(state, EventType::Speeding, now) {
                emitted.push(self.record(
                    state,
                    EventType::Speeding,
                    finding.severity,
                    now,
                    finding.excess_kmh,
                    self.config.tick_interval_ms,
                    finding.confidence,
                ));
            }
        }
    }

    /// Run the positive-behavior detectors over the pattern window.
    pub fn analyze_positive_behavior(&self) {
        let emitted = {
            let mut inner = self.inner.lock();
            let Some(state) = inner.as_mut() else {
                return;
            };
            let Some(now) = state.now_ms() else {
                return;
            };

            let mut emitted: Vec<DrivingEvent> = Vec::new();
            let speeds = state.speeds.window_ms(self.config.pattern_window_ms);
            let snapshots = state.snapshots.window_ms(self.config.pattern_window_ms);

            if speeds.len() >= self.config.min_samples
                && self.off_cooldown(state, EventType::SmoothDriving, now)
            {
                let avg_kmh = speeds.iter().map(|s| s.value).sum::<f64>()
                    / speeds.len() as f64
                    * 3.6;
                if detect_smooth_driving(
                    &state.events,
                    now,
                    self.config.pattern_window_ms,
                    avg_kmh,
                    self.config.smooth_min_avg_kmh,
                ) {
                    emitted.push(self.record(
                        state,
                        EventType::SmoothDriving,
                        Severity::Low,
                        now,
                        avg_kmh,
                        self.config.pattern_window_ms,
                        0.7,
                    ));
                }
            }

            if snapshots.len() >= self.config.min_samples
                && self.off_cooldown(state, EventType::EcoDriving, now)
            {
                let magnitudes: Vec<f64> = snapshots
                    .iter()
                    .map(|s| s.value.acceleration_magnitude)
                    .collect();
                if let Some(fraction) = detect_eco_driving(
                    &magnitudes,
                    self.config.eco_band_low_mps2,
                    self.config.eco_band_high_mps2,
                    self.config.eco_min_fraction,
                ) {
                    emitted.push(self.record(
                        state,
                        EventType::EcoDriving,
                        Severity::Low,
                        now,
                        fraction,
                        self.config.pattern_window_ms,
                        0.75,
                    ));
                }
            }

            emitted
        };

        for event in emitted {
            self.bus.publish_event(event);
        }
    }

    /// Close the trip and emit exactly one [`TripScore`].
    ///
    /// Returns `None` for a trip that recorded no events - the
    /// distinguishable "no data" outcome - and for calls without an open
    /// trip. Safe to call at any point, including between buffer writes;
    /// the trip state is taken out atomically so finalization runs once.
    pub fn stop_event_detection(&self) -> Option<TripScore> {
        let state = self.inner.lock().take()?;
        let ended_at = Utc::now();

        if state.events.is_empty() {
            info!("Trip stopped with no recorded events (no-data trip)");
            return None;
        }

        // Sample timestamps are authoritative for duration; wall clock is
        // the fallback for trips that never buffered a sample.
        let monotonic_span = match (state.first_sample_ms, state.last_sample_ms) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => 0,
        };
        let duration_ms = if monotonic_span > 0 {
            monotonic_span
        } else {
            (ended_at - state.started_at).num_milliseconds().max(0) as u64
        };
        let average_speed_kmh = if state.speed_count > 0 {
            state.speed_sum_mps / state.speed_count as f64 * 3.6
        } else {
            0.0
        };
        let statistics = TripStatistics {
            distance_m: state.distance_m,
            duration_ms,
            average_speed_kmh,
            max_speed_kmh: state.max_speed_mps * 3.6,
            speeding_duration_ms: state.speeding_ms,
            idle_time_ms: state.idle_ms,
            night_driving_percent: night_fraction(state.started_at, ended_at) * 100.0,
        };

        let score =
            compute_trip_score(&state.events, statistics, state.started_at, ended_at);
        info!(
            events = score.events.len(),
            overall = score.overall_score,
            "Trip stopped and scored"
        );
        self.bus.publish_score(score.clone());
        Some(score)
    }

    fn off_cooldown(&self, state: &TripState, event_type: EventType, now: u64) -> bool {
        let refractory = match event_type {
            EventType::HardBraking
            | EventType::RapidAcceleration
            | EventType::HarshCornering
            | EventType::Speeding => self.config.analysis_window_ms,
            _ => self.config.pattern_window_ms,
        };
        state
            .last_emitted
            .get(&event_type)
            .map(|&t| now.saturating_sub(t) >= refractory)
            .unwrap_or(true)
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        state: &mut TripState,
        event_type: EventType,
        severity: Severity,
        now: u64,
        magnitude: f64,
        duration_ms: u64,
        confidence: f64,
    ) -> DrivingEvent {
        let recorded_at = Utc::now();
        let context = state.last_location.map(|fix| EventContext {
            road_type: self
                .speed_limits
                .lookup(fix.latitude, fix.longitude)
                .map(|l| l.road_type),
            time_of_day: Some(TimeOfDay::from_hour(recorded_at.hour())),
            weather: None,
            traffic: None,
        });

        let event = DrivingEvent {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            severity,
            timestamp_ms: now,
            recorded_at,
            latitude: state.last_location.map(|f| f.latitude),
            longitude: state.last_location.map(|f| f.longitude),
            speed_mps: state.speeds.latest().map(|s| s.value),
            magnitude,
            duration_ms,
            confidence: confidence.clamp(0.0, 1.0),
            context,
        };

        debug!(?event_type, ?severity, magnitude, "Driving event recorded");
        state.events.push(event.clone());
        state.last_emitted.insert(event_type, now);
        event
    }

    /// Periodic task: buffer bus streams, tick the detectors.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> anyhow::Result<()> {
        info!("Starting driving event detector...");

        let mut snapshot_rx = self.bus.subscribe_snapshots();
        let mut location_rx = self.bus.subscribe_locations();
        let mut analyze_tick =
            interval(Duration::from_millis(self.config.tick_interval_ms));
        let mut positive_tick =
            interval(Duration::from_millis(self.config.positive_interval_ms));

        loop {
            tokio::select! {
                Ok(snapshot) = snapshot_rx.recv() => {
                    self.update_motion(&snapshot);
                }
                Ok(fix) = location_rx.recv() => {
                    self.update_location(&fix);
                }
                _ = analyze_tick.tick() => {
                    self.analyze_events();
                }
                _ = positive_tick.tick() => {
                    self.analyze_positive_behavior();
                }
                _ = shutdown.recv() => {
                    info!("Driving event detector shutting down...");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Fraction of the wall-clock span spent in night hours (20:00-06:00).
fn night_fraction(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let total_minutes = (end - start).num_minutes();
    if total_minutes <= 0 {
        let hour = start.hour();
        return if !(6..20).contains(&hour) { 1.0 } else { 0.0 };
    }

    let mut night_minutes = 0i64;
    for i in 0..total_minutes {
        let t = start + chrono::Duration::minutes(i);
        if !(6..20).contains(&t.hour()) {
            night_minutes += 1;
        }
    }
    night_minutes as f64 / total_minutes as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{SpeedLimitInfo, SpeedLimitZone, StaticSpeedLimitSource};

    fn detector() -> DrivingEventDetector {
        DrivingEventDetector::new(
            DetectionConfig::default(),
            Arc::new(StaticSpeedLimitSource::default()),
            Arc::new(EventBus::new(64)),
        )
    }

    fn fix(ts: u64, speed: f64) -> LocationSample {
        LocationSample {
            latitude: -1.2864,
            longitude: 36.8172,
            altitude: 1700.0,
            speed_mps: Some(speed),
            accuracy_m: 5.0,
            bearing_deg: 0.0,
            timestamp_ms: ts,
        }
    }

    #[test]
    fn start_is_idempotent_and_stop_without_events_is_no_data() {
        let d = detector();
        d.start_event_detection();
        d.update_location(&fix(0, 10.0));
        d.start_event_detection(); // must not reset the open trip
        assert!(d.is_running());

        // No events recorded: the stop is the distinguishable no-data trip.
        assert!(d.stop_event_detection().is_none());
        assert!(!d.is_running());
        // Second stop: nothing left to finalize.
        assert!(d.stop_event_detection().is_none());
    }

    #[test]
    fn hard_braking_trip_produces_event_and_score() {
        let d = detector();
        d.start_event_detection();

        // Cruise at 20 m/s, then slam to 2 m/s within a second.
        for i in 0..10u64 {
            d.update_location(&fix(i * 500, 20.0));
        }
        let t0 = 5000u64;
        for (i, speed) in [20.0, 15.5, 11.0, 6.5, 2.0].iter().enumerate() {
            d.update_location(&fix(t0 + i as u64 * 250, *speed));
        }

        d.analyze_events();
        let score = d.stop_event_detection().expect("trip recorded events");

        assert!(score
            .events
            .iter()
            .any(|e| e.event_type == EventType::HardBraking));
        assert!(score.safety_score < 100.0);
        assert!(score.statistics.distance_m >= 0.0);
    }

    #[test]
    fn detectors_abstain_without_samples() {
        let d = detector();
        d.start_event_detection();
        d.analyze_events(); // no buffered samples at all: silent no-op
        d.analyze_positive_behavior();
        assert!(d.stop_event_detection().is_none());
    }

    #[test]
    fn updates_before_start_are_ignored() {
        let d = detector();
        d.update_location(&fix(0, 30.0));
        d.update_motion(&MotionSnapshot {
            acceleration_magnitude: 1.0,
            gyroscope_magnitude: 0.0,
            magnetic_field_magnitude: 0.0,
            linear_acceleration: [0.0; 3],
            gravity: [0.0, 0.0, 9.81],
            activity: crate::motion::ActivityType::InVehicle,
            confidence: 0.9,
            step_count: 0,
            step_frequency: 0.0,
            timestamp_ms: 0,
        });
        assert!(!d.is_running());
        assert!(d.stop_event_detection().is_none());
    }

    #[test]
    fn speeding_requires_a_limit_lookup_hit() {
        // Empty table: lookup always misses, detector must abstain.
        let d = detector();
        d.start_event_detection();
        for i in 0..10u64 {
            d.update_location(&fix(i * 500, 40.0)); // 144 km/h
        }
        d.analyze_events();
        let score = d.stop_event_detection();
        assert!(score.is_none(), "no lookup hit should mean no events");

        // With a residential zone covering the fix, the same trip speeds.
        let mut limits = StaticSpeedLimitSource::default();
        limits.add_zone(SpeedLimitZone {
            min_latitude: -2.0,
            max_latitude: 0.0,
            min_longitude: 36.0,
            max_longitude: 37.0,
            info: SpeedLimitInfo {
                limit_kmh: 50.0,
                road_type: RoadType::Residential,
            },
        });
        let d = DrivingEventDetector::new(
            DetectionConfig::default(),
            Arc::new(limits),
            Arc::new(EventBus::new(64)),
        );
        d.start_event_detection();
        for i in 0..10u64 {
            d.update_location(&fix(i * 500, 40.0));
        }
        d.analyze_events();
        let score = d.stop_event_detection().expect("speeding recorded");
        assert!(score
            .events
            .iter()
            .any(|e| e.event_type == EventType::Speeding
                && e.severity == Severity::Critical));
    }

    #[test]
    fn night_fraction_brackets() {
        use chrono::TimeZone;
        let day_start = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let day_end = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();
        assert_eq!(night_fraction(day_start, day_end), 0.0);

        let night_start = Utc.with_ymd_and_hms(2026, 3, 10, 22, 0, 0).unwrap();
        let night_end = Utc.with_ymd_and_hms(2026, 3, 10, 23, 0, 0).unwrap();
        assert_eq!(night_fraction(night_start, night_end), 1.0);
    }
}
