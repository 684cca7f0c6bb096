//! Bounded per-hand motion history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::{Position3D, Timestamp};

/// Default number of samples kept per hand.
pub const MOTION_WINDOW_CAPACITY: usize = 30;

/// Wrist position at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: Position3D,
    pub time: Timestamp,
}

impl Sample {
    pub fn new(position: Position3D, time: Timestamp) -> Self {
        Self { position, time }
    }

    /// Speed (m/s) travelled from `previous` to `self`, or `None` when the
    /// time delta does not exceed `min_dt` seconds.
    pub fn speed_from(&self, previous: &Sample, min_dt: f64) -> Option<f32> {
        let dt = self.time.elapsed_since(previous.time);
        if dt <= min_dt {
            return None;
        }
        Some(previous.position.distance_to(&self.position) / dt as f32)
    }
}

/// Ring buffer of recent samples for one hand, oldest first.
///
/// Appends never reorder; once full, each append evicts from the front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl MotionWindow {
    pub fn new() -> Self {
        Self::with_capacity(MOTION_WINDOW_CAPACITY)
    }

    /// A zero capacity is bumped to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            warn!("motion window capacity 0 requested, using 1");
        }
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn append(&mut self, position: Position3D, time: Timestamp) {
        self.push(Sample::new(position, time));
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            let excess = self.samples.len() - self.capacity;
            self.samples.drain(..excess);
        }
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The `index`-th sample, oldest first.
    pub fn sample(&self, index: usize) -> Result<Sample> {
        self.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.samples.len(),
        })
    }

    pub fn get(&self, index: usize) -> Option<Sample> {
        self.samples.get(index).copied()
    }

    pub fn latest(&self) -> Option<Sample> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    /// Ok when at least `required` samples are held.
    pub fn require_history(&self, required: usize) -> Result<()> {
        if self.samples.len() < required {
            return Err(Error::InsufficientHistory {
                required,
                available: self.samples.len(),
            });
        }
        Ok(())
    }

    /// Consecutive sample pairs, oldest first.
    pub fn pairs(&self) -> impl Iterator<Item = (&Sample, &Sample)> + '_ {
        self.samples.iter().zip(self.samples.iter().skip(1))
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for MotionWindow {
    fn default() -> Self {
        Self::new()
    }
}
