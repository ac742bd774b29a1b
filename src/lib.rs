// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Tripsight - Insurance Telematics Analytics Core
//!
//! The analytical core of an insurance-telematics product: fuses inertial,
//! GPS, and power-state signals from a moving vehicle to classify rider
//! activity, detect discrete driving events with severity and confidence,
//! score completed trips, and adapt sensor/location sampling to the battery.
//! Everything around it - UI, persistence, sync, permissions - is a thin
//! client supplying raw samples and consuming typed outputs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Tripsight Engine                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐   ┌────────────┐   ┌───────────────────────┐   │
//! │  │ Source  │ → │   Motion   │ → │  Driving Event        │   │
//! │  │ Manager │   │ Classifier │   │  Detector → TripScore │   │
//! │  └─────────┘   └────────────┘   └───────────────────────┘   │
//! │       ↓              ↓                     ↓                 │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                      Event Bus                       │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │       ↑                                    ↓                 │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │   Adaptive Sampling Controller → SamplingStrategy    │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sampling strategy feeds back into the source manager, closing the
//! fidelity-versus-battery loop.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod config;
pub mod core;
pub mod detection;
pub mod motion;
pub mod sampling;
pub mod sources;

// Re-exports for convenience
pub use config::TelemetryConfig;
pub use core::{Engine, EngineSources, EventBus};
pub use detection::{DrivingEvent, DrivingEventDetector, EventType, Severity, TripScore};
pub use motion::{ActivityType, MotionClassifier, MotionSnapshot};
pub use sampling::{
    AdaptiveSamplingController, DrivingContext, PowerMode, PowerState, SamplingStrategy,
};
pub use sources::{
    LocationSample, LocationSource, PowerSource, RawSensorSample, SensorKind,
    SensorSource, SpeedLimitSource,
};

/// Tripsight version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tripsight name
pub const NAME: &str = "Tripsight";
