//! Geometric utilities for hand-skeleton transforms.

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::types::{HandJoint, Position3D, SkeletonSnapshot};

/// Rigid 4x4 homogeneous transform (rotation + translation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D(pub Matrix4<f32>);

impl Transform3D {
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    pub fn from_matrix(matrix: Matrix4<f32>) -> Self {
        Self(matrix)
    }

    pub fn from_translation(position: Position3D) -> Self {
        Self(Matrix4::new_translation(&position.to_nalgebra()))
    }

    /// Translation component (fourth column).
    pub fn translation(&self) -> Position3D {
        let column = self.0.column(3);
        Position3D::new(column[0], column[1], column[2])
    }

    /// `self * other`, i.e. apply `other` first.
    pub fn compose(&self, other: &Transform3D) -> Transform3D {
        Transform3D(self.0 * other.0)
    }

    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.0
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

/// Euclidean distance between two positions.
pub fn distance(a: &Position3D, b: &Position3D) -> f32 {
    (b.to_nalgebra() - a.to_nalgebra()).norm()
}

/// World-space distance between the wrists of two hands.
///
/// `None` when either wrist joint is missing or untracked.
pub fn hands_distance(left: &SkeletonSnapshot, right: &SkeletonSnapshot) -> Option<f32> {
    let left_wrist = left.joint_world_position(HandJoint::Wrist)?;
    let right_wrist = right.joint_world_position(HandJoint::Wrist)?;
    Some(distance(&left_wrist, &right_wrist))
}
