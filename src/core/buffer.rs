// Copyright (c) 2026 tripsight
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/tripsight/tripsight-rs

//! Bounded, timestamp-ordered ring buffers for sensor streams

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single timestamped value in a sensor stream.
///
/// Timestamps are milliseconds on the stream's own monotonic clock and are
/// non-decreasing within a stream. Wall-clock time never enters window math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimestampedSample<T> {
    /// Milliseconds on the stream's monotonic clock.
    pub timestamp_ms: u64,
    /// The sampled value.
    pub value: T,
}

/// Why a sample was rejected at ingestion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SampleError {
    /// A component of the sample was NaN or infinite.
    #[error("non-finite component in sample at {timestamp_ms} ms")]
    NonFinite {
        /// Timestamp of the offending sample.
        timestamp_ms: u64,
    },
    /// The sample's timestamp regressed below the newest buffered one.
    #[error("timestamp regressed: {timestamp_ms} < {newest_ms}")]
    OutOfOrder {
        /// Timestamp of the offending sample.
        timestamp_ms: u64,
        /// Newest timestamp already in the buffer.
        newest_ms: u64,
    },
}

/// Bounded FIFO buffer of timestamped samples.
///
/// Holds the most recent `capacity` samples; pushing into a full buffer
/// evicts the oldest entry. Ordering is maintained by rejecting regressed
/// timestamps, so window queries can trust timestamps rather than indices.
#[derive(Debug, Clone)]
pub struct SampleBuffer<T> {
    samples: VecDeque<TimestampedSample<T>>,
    capacity: usize,
}

impl<T: Clone> SampleBuffer<T> {
    /// Create a buffer bounded at `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a sample, evicting the oldest entry when full.
    ///
    /// Equal timestamps are accepted (non-decreasing, not strictly
    /// increasing); a regressed timestamp is rejected so the buffer never
    /// loses its ordering invariant.
    pub fn push(&mut self, timestamp_ms: u64, value: T) -> Result<(), SampleError> {
        if let Some(newest) = self.samples.back() {
            if timestamp_ms < newest.timestamp_ms {
                return Err(SampleError::OutOfOrder {
                    timestamp_ms,
                    newest_ms: newest.timestamp_ms,
                });
            }
        }

        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(TimestampedSample {
            timestamp_ms,
            value,
        });
        Ok(())
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples are buffered.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop all buffered samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// The newest sample, if any.
    pub fn latest(&self) -> Option<&TimestampedSample<T>> {
        self.samples.back()
    }

    /// Timestamp of the newest sample, if any.
    pub fn latest_timestamp(&self) -> Option<u64> {
        self.samples.back().map(|s| s.timestamp_ms)
    }

    /// The newest `n` samples, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<TimestampedSample<T>> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).cloned().collect()
    }

    /// All samples within `window_ms` of the newest timestamp, oldest first.
    ///
    /// The window is anchored on the newest buffered sample, not on wall
    /// clock, so a delayed analysis tick sees the same window a punctual one
    /// would have.
    pub fn window_ms(&self, window_ms: u64) -> Vec<TimestampedSample<T>> {
        let Some(newest) = self.latest_timestamp() else {
            return Vec::new();
        };
        let cutoff = newest.saturating_sub(window_ms);
        self.samples
            .iter()
            .filter(|s| s.timestamp_ms >= cutoff)
            .cloned()
            .collect()
    }

    /// Iterate over all buffered samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TimestampedSample<T>> {
        self.samples.iter()
    }
}
