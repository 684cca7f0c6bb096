//! Static pose classification.
//!
//! Poses are read from wrist-relative fingertip distances measured in the
//! snapshot's hand-local frame. A missing or untracked joint means the pose
//! is not present.

use handsign_core::{HandJoint, Result, SkeletonSnapshot};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Distance thresholds (meters) for pose detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseThresholds {
    /// Every fingertip must be within this distance of the wrist for a fist
    pub fist_m: f32,
    /// Thumb tip must be strictly farther than this from the wrist
    pub thumb_extended_m: f32,
    /// Non-thumb fingertips must be within this distance for thumbs-up
    pub curled_m: f32,
}

impl Default for PoseThresholds {
    fn default() -> Self {
        Self {
            fist_m: 0.15,
            thumb_extended_m: 0.05,
            curled_m: 0.15,
        }
    }
}

/// Stateless pose classifier
#[derive(Debug, Clone, Default)]
pub struct PoseClassifier {
    thresholds: PoseThresholds,
}

impl PoseClassifier {
    pub fn new(thresholds: PoseThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PoseThresholds {
        &self.thresholds
    }

    /// All five fingertips within `fist_m` of the wrist (inclusive).
    pub fn is_fist(&self, snapshot: &SkeletonSnapshot) -> bool {
        match fingertip_distances(snapshot) {
            Ok(distances) => distances.iter().all(|d| *d <= self.thresholds.fist_m),
            Err(e) => {
                trace!(hand = %snapshot.chirality, "fist check skipped: {}", e);
                false
            }
        }
    }

    /// Thumb extended past `thumb_extended_m`, the other four fingertips
    /// within `curled_m`.
    pub fn is_thumbs_up(&self, snapshot: &SkeletonSnapshot) -> bool {
        match fingertip_distances(snapshot) {
            Ok([thumb, others @ ..]) => {
                thumb > self.thresholds.thumb_extended_m
                    && others.iter().all(|d| *d <= self.thresholds.curled_m)
            }
            Err(e) => {
                trace!(hand = %snapshot.chirality, "thumbs-up check skipped: {}", e);
                false
            }
        }
    }
}

/// Wrist-to-fingertip distances, thumb first.
pub fn fingertip_distances(snapshot: &SkeletonSnapshot) -> Result<[f32; 5]> {
    let wrist = snapshot.require_joint(HandJoint::Wrist)?.position();
    let mut distances = [0.0f32; 5];
    for (slot, tip) in distances.iter_mut().zip(HandJoint::fingertips()) {
        let position = snapshot.require_joint(tip)?.position();
        *slot = wrist.distance_to(&position);
    }
    Ok(distances)
}

/// [`PoseClassifier::is_fist`] with default thresholds.
pub fn is_fist(snapshot: &SkeletonSnapshot) -> bool {
    PoseClassifier::default().is_fist(snapshot)
}

/// [`PoseClassifier::is_thumbs_up`] with default thresholds.
pub fn is_thumbs_up(snapshot: &SkeletonSnapshot) -> bool {
    PoseClassifier::default().is_thumbs_up(snapshot)
}
