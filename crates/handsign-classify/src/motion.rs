//! Dynamic motion classification over a hand's motion window.
//!
//! Shake is a speed-variability detector: it counts consecutive sample pairs
//! whose speed exceeds a threshold. It does not look at direction or
//! frequency. Wave is a shake whose hand is not currently a fist.

use handsign_core::{MotionWindow, SkeletonSnapshot};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::pose::PoseClassifier;

/// Thresholds for shake/wave detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionThresholds {
    /// Pairs with a time delta at or below this (seconds) are skipped
    pub min_time_delta_s: f64,
    /// Speed (m/s) above which a pair counts as significant
    pub speed_variability: f32,
    /// Significant pairs needed to call it shaking
    pub min_significant: usize,
}

impl Default for MotionThresholds {
    fn default() -> Self {
        Self {
            min_time_delta_s: 1e-3,
            speed_variability: 0.05,
            min_significant: 3,
        }
    }
}

/// Stateless motion classifier
#[derive(Debug, Clone, Default)]
pub struct MotionClassifier {
    thresholds: MotionThresholds,
    pose: PoseClassifier,
}

impl MotionClassifier {
    pub fn new(thresholds: MotionThresholds, pose: PoseClassifier) -> Self {
        Self { thresholds, pose }
    }

    pub fn thresholds(&self) -> &MotionThresholds {
        &self.thresholds
    }

    /// Speeds between consecutive samples across the whole window.
    ///
    /// Pairs whose time delta is too small are dropped, not replaced, so the
    /// result can be shorter than `count() - 1`.
    pub fn speed_series(&self, window: &MotionWindow) -> Vec<f32> {
        window
            .pairs()
            .filter_map(|(prev, curr)| curr.speed_from(prev, self.thresholds.min_time_delta_s))
            .collect()
    }

    pub fn is_shaking(&self, window: &MotionWindow) -> bool {
        if let Err(e) = window.require_history(2) {
            trace!("shake check skipped: {}", e);
            return false;
        }

        let significant = self
            .speed_series(window)
            .iter()
            .filter(|speed| speed.abs() > self.thresholds.speed_variability)
            .count();

        significant >= self.thresholds.min_significant
    }

    /// Shaking, and the same hand is not a fist in this frame.
    pub fn is_waving(&self, window: &MotionWindow, snapshot: &SkeletonSnapshot) -> bool {
        self.is_shaking(window) && !self.pose.is_fist(snapshot)
    }
}

/// [`MotionClassifier::speed_series`] with default thresholds.
pub fn speed_series(window: &MotionWindow) -> Vec<f32> {
    MotionClassifier::default().speed_series(window)
}

/// [`MotionClassifier::is_shaking`] with default thresholds.
pub fn is_shaking(window: &MotionWindow) -> bool {
    MotionClassifier::default().is_shaking(window)
}

/// [`MotionClassifier::is_waving`] with default thresholds.
pub fn is_waving(window: &MotionWindow, snapshot: &SkeletonSnapshot) -> bool {
    MotionClassifier::default().is_waving(window, snapshot)
}
