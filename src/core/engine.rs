//! Engine - wires sources, pipelines, and the event bus together

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{EventBus, SystemState};
use crate::config::TelemetryConfig;
use crate::detection::{DrivingEventDetector, TripScore};
use crate::motion::MotionClassifier;
use crate::sampling::AdaptiveSamplingController;
use crate::sources::{
    LocationSource, PowerSource, SensorSource, SourceManager, SpeedLimitSource,
};

/// The external collaborators an engine is wired to.
pub struct EngineSources {
    /// Raw tri-axis sample producer.
    pub sensors: Box<dyn SensorSource>,
    /// Location fix producer.
    pub location: Box<dyn LocationSource>,
    /// Device power telemetry.
    pub power: Arc<dyn PowerSource>,
    /// Speed-limit/road-type lookup.
    pub speed_limits: Arc<dyn SpeedLimitSource>,
}

/// Top-level engine: owns the bus, the three analysis components, and the
/// source pump, and runs them as independent periodic tasks.
///
/// Components share no locks with each other; everything crosses the bus.
pub struct Engine {
    bus: Arc<EventBus>,
    classifier: Arc<MotionClassifier>,
    detector: Arc<DrivingEventDetector>,
    controller: Arc<AdaptiveSamplingController>,
    manager: Arc<SourceManager>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<Result<()>>>,
    state: Arc<RwLock<SystemState>>,
    start_time: Option<Instant>,
}

impl Engine {
    /// Build an engine from configuration and explicitly injected sources.
    pub fn new(config: TelemetryConfig, sources: EngineSources) -> Self {
        let bus = Arc::new(EventBus::new(config.bus_capacity));
        let (shutdown_tx, _) = broadcast::channel(1);

        let classifier = Arc::new(MotionClassifier::new(config.motion.clone(), bus.clone()));
        let detector = Arc::new(DrivingEventDetector::new(
            config.detection.clone(),
            sources.speed_limits.clone(),
            bus.clone(),
        ));
        let controller = Arc::new(AdaptiveSamplingController::new(
            config.sampling.clone(),
            sources.power.clone(),
            bus.clone(),
        ));
        let manager = Arc::new(SourceManager::new(
            bus.clone(),
            sources.sensors,
            sources.location,
        ));

        Self {
            bus,
            classifier,
            detector,
            controller,
            manager,
            shutdown_tx,
            tasks: Vec::new(),
            state: Arc::new(RwLock::new(SystemState::default())),
            start_time: None,
        }
    }

    /// Spawn every periodic task.
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting tripsight engine...");
        self.start_time = Some(Instant::now());

        let classifier = self.classifier.clone();
        let rx = self.shutdown_tx.subscribe();
        self.tasks
            .push(tokio::spawn(async move { classifier.run(rx).await }));

        let detector = self.detector.clone();
        let rx = self.shutdown_tx.subscribe();
        self.tasks
            .push(tokio::spawn(async move { detector.run(rx).await }));

        let controller = self.controller.clone();
        let rx = self.shutdown_tx.subscribe();
        self.tasks
            .push(tokio::spawn(async move { controller.run(rx).await }));

        let manager = self.manager.clone();
        let rx = self.shutdown_tx.subscribe();
        self.tasks
            .push(tokio::spawn(async move { manager.run(rx).await }));

        {
            let mut state = self.state.write().await;
            state.running = true;
        }

        info!("Engine started");
        Ok(())
    }

    /// Signal every task to stop and wait for them to drain.
    ///
    /// Safe to call mid-tick: an open trip is finalized exactly once.
    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping tripsight engine...");

        let _ = self.shutdown_tx.send(());
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("Task join error on shutdown: {}", e);
            }
        }

        // Close a still-open trip so no partial state outlives the engine.
        self.detector.stop_event_detection();

        {
            let mut state = self.state.write().await;
            state.running = false;
            state.trip_open = false;
        }

        info!("Engine stopped");
        Ok(())
    }

    /// Open a trip in the event detector. Idempotent while a trip is open.
    pub async fn start_trip(&self) {
        self.detector.start_event_detection();
        let mut state = self.state.write().await;
        state.trip_open = true;
    }

    /// Close the open trip, returning its score (`None` for a no-data trip).
    pub async fn stop_trip(&self) -> Option<TripScore> {
        let score = self.detector.stop_event_detection();
        let mut state = self.state.write().await;
        state.trip_open = false;
        score
    }

    /// The engine's event bus, for subscribing to output streams.
    pub fn bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    /// Snapshot of the engine's system state.
    pub async fn state(&self) -> SystemState {
        let mut state = self.state.read().await.clone();
        state.uptime_seconds = self.uptime();
        state
    }

    /// Seconds since the engine was started.
    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }
}
