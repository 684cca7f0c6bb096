//! Fundamental types for the handsign gesture pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::geometry::Transform3D;

/// Frame timestamp in seconds.
///
/// Monotonic or wall-clock, as long as a single source is used for every
/// frame fed into the same pipeline.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_micros() as f64 / 1_000_000.0)
    }

    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }

    /// Timestamp shifted by `secs` seconds.
    pub fn offset(&self, secs: f64) -> Self {
        Self(self.0 + secs)
    }

    /// Seconds elapsed since `earlier` (negative if `earlier` is later).
    pub fn elapsed_since(&self, earlier: Timestamp) -> f64 {
        self.0 - earlier.0
    }
}

/// Which hand a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chirality {
    Left,
    Right,
}

impl Chirality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Chirality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The 27 tracked joints of a hand skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum HandJoint {
    Wrist = 0,
    ThumbKnuckle = 1,
    ThumbIntermediateBase = 2,
    ThumbIntermediateTip = 3,
    ThumbTip = 4,
    IndexMetacarpal = 5,
    IndexKnuckle = 6,
    IndexIntermediateBase = 7,
    IndexIntermediateTip = 8,
    IndexTip = 9,
    MiddleMetacarpal = 10,
    MiddleKnuckle = 11,
    MiddleIntermediateBase = 12,
    MiddleIntermediateTip = 13,
    MiddleTip = 14,
    RingMetacarpal = 15,
    RingKnuckle = 16,
    RingIntermediateBase = 17,
    RingIntermediateTip = 18,
    RingTip = 19,
    LittleMetacarpal = 20,
    LittleKnuckle = 21,
    LittleIntermediateBase = 22,
    LittleIntermediateTip = 23,
    LittleTip = 24,
    ForearmWrist = 25,
    ForearmArm = 26,
}

/// Total number of joints per hand.
pub const JOINT_COUNT: usize = 27;

impl HandJoint {
    const ALL: [HandJoint; JOINT_COUNT] = [
        Self::Wrist,
        Self::ThumbKnuckle,
        Self::ThumbIntermediateBase,
        Self::ThumbIntermediateTip,
        Self::ThumbTip,
        Self::IndexMetacarpal,
        Self::IndexKnuckle,
        Self::IndexIntermediateBase,
        Self::IndexIntermediateTip,
        Self::IndexTip,
        Self::MiddleMetacarpal,
        Self::MiddleKnuckle,
        Self::MiddleIntermediateBase,
        Self::MiddleIntermediateTip,
        Self::MiddleTip,
        Self::RingMetacarpal,
        Self::RingKnuckle,
        Self::RingIntermediateBase,
        Self::RingIntermediateTip,
        Self::RingTip,
        Self::LittleMetacarpal,
        Self::LittleKnuckle,
        Self::LittleIntermediateBase,
        Self::LittleIntermediateTip,
        Self::LittleTip,
        Self::ForearmWrist,
        Self::ForearmArm,
    ];

    /// Array index (0-26).
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn all() -> &'static [HandJoint; JOINT_COUNT] {
        &Self::ALL
    }

    /// Fingertips, thumb first.
    pub fn fingertips() -> [HandJoint; 5] {
        [
            Self::ThumbTip,
            Self::IndexTip,
            Self::MiddleTip,
            Self::RingTip,
            Self::LittleTip,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbKnuckle => "thumb-knuckle",
            Self::ThumbIntermediateBase => "thumb-intermediate-base",
            Self::ThumbIntermediateTip => "thumb-intermediate-tip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMetacarpal => "index-metacarpal",
            Self::IndexKnuckle => "index-knuckle",
            Self::IndexIntermediateBase => "index-intermediate-base",
            Self::IndexIntermediateTip => "index-intermediate-tip",
            Self::IndexTip => "index-tip",
            Self::MiddleMetacarpal => "middle-metacarpal",
            Self::MiddleKnuckle => "middle-knuckle",
            Self::MiddleIntermediateBase => "middle-intermediate-base",
            Self::MiddleIntermediateTip => "middle-intermediate-tip",
            Self::MiddleTip => "middle-tip",
            Self::RingMetacarpal => "ring-metacarpal",
            Self::RingKnuckle => "ring-knuckle",
            Self::RingIntermediateBase => "ring-intermediate-base",
            Self::RingIntermediateTip => "ring-intermediate-tip",
            Self::RingTip => "ring-tip",
            Self::LittleMetacarpal => "little-metacarpal",
            Self::LittleKnuckle => "little-knuckle",
            Self::LittleIntermediateBase => "little-intermediate-base",
            Self::LittleIntermediateTip => "little-intermediate-tip",
            Self::LittleTip => "little-tip",
            Self::ForearmWrist => "forearm-wrist",
            Self::ForearmArm => "forearm-arm",
        }
    }
}

impl fmt::Display for HandJoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandJoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|j| j.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidInput(format!("unknown joint name: {s}")))
    }
}

/// 3D position in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn to_nalgebra(&self) -> nalgebra::Vector3<f32> {
        nalgebra::Vector3::new(self.x, self.y, self.z)
    }

    pub fn from_nalgebra(v: nalgebra::Vector3<f32>) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn distance_to(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Pose of a single joint relative to the hand anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointPose {
    pub anchor_from_joint: Transform3D,
    pub tracked: bool,
}

impl JointPose {
    pub fn at(position: Position3D) -> Self {
        Self {
            anchor_from_joint: Transform3D::from_translation(position),
            tracked: true,
        }
    }

    /// Joint position in the hand-local (anchor) frame.
    pub fn position(&self) -> Position3D {
        self.anchor_from_joint.translation()
    }
}

/// One frame of skeleton data for one hand.
///
/// Populated once per frame by the acquisition side; classifiers only ever
/// see this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonSnapshot {
    pub anchor_id: Uuid,
    pub chirality: Chirality,
    /// Hand anchor (wrist) to world.
    pub origin_from_anchor: Transform3D,
    pub joints: [Option<JointPose>; JOINT_COUNT],
    pub is_tracked: bool,
}

impl SkeletonSnapshot {
    /// Tracked snapshot with no joints and the anchor at the world origin.
    pub fn new(chirality: Chirality) -> Self {
        Self {
            anchor_id: Uuid::new_v4(),
            chirality,
            origin_from_anchor: Transform3D::identity(),
            joints: [None; JOINT_COUNT],
            is_tracked: true,
        }
    }

    pub fn with_joint(mut self, joint: HandJoint, position: Position3D) -> Self {
        self.joints[joint.index()] = Some(JointPose::at(position));
        self
    }

    pub fn with_joint_pose(mut self, joint: HandJoint, pose: JointPose) -> Self {
        self.joints[joint.index()] = Some(pose);
        self
    }

    pub fn with_origin(mut self, position: Position3D) -> Self {
        self.origin_from_anchor = Transform3D::from_translation(position);
        self
    }

    pub fn untracked(mut self) -> Self {
        self.is_tracked = false;
        self
    }

    /// A joint that is present and tracked.
    pub fn joint(&self, joint: HandJoint) -> Option<&JointPose> {
        self.joints[joint.index()].as_ref().filter(|j| j.tracked)
    }

    pub fn require_joint(&self, joint: HandJoint) -> Result<&JointPose> {
        self.joint(joint).ok_or(Error::MissingJointData { joint })
    }

    /// Hand-local position of a joint.
    pub fn joint_position(&self, joint: HandJoint) -> Option<Position3D> {
        self.joint(joint).map(JointPose::position)
    }

    /// Hand-local distance from a joint to the wrist joint.
    pub fn joint_distance_to_wrist(&self, joint: HandJoint) -> Option<f32> {
        let wrist = self.joint_position(HandJoint::Wrist)?;
        let target = self.joint_position(joint)?;
        Some(wrist.distance_to(&target))
    }

    /// World position of a joint.
    pub fn joint_world_position(&self, joint: HandJoint) -> Option<Position3D> {
        self.joint(joint)
            .map(|j| self.origin_from_anchor.compose(&j.anchor_from_joint).translation())
    }

    /// World position of the hand anchor, which sits at the wrist.
    pub fn wrist_position(&self) -> Position3D {
        self.origin_from_anchor.translation()
    }
}

/// A skeleton snapshot stamped with its capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    pub timestamp: Timestamp,
    pub snapshot: SkeletonSnapshot,
}

impl HandFrame {
    pub fn new(timestamp: Timestamp, snapshot: SkeletonSnapshot) -> Self {
        Self {
            timestamp,
            snapshot,
        }
    }

    pub fn chirality(&self) -> Chirality {
        self.snapshot.chirality
    }
}

/// Gestures surfaced to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureKind {
    ThumbsUp,
    /// Reserved: no built-in detector produces it.
    ThumbsDown,
    Wave,
    #[default]
    None,
}

impl GestureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThumbsUp => "thumbs-up",
            Self::ThumbsDown => "thumbs-down",
            Self::Wave => "wave",
            Self::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
