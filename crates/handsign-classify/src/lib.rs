//! # Handsign-Classify
//!
//! Stateless gesture classifiers over hand-skeleton geometry.
//!
//! ## Poses
//!
//! Read from a single [`SkeletonSnapshot`](handsign_core::SkeletonSnapshot)
//! using wrist-to-fingertip distances in the hand-local frame:
//!
//! - **Fist**: every fingertip within 0.15 m of the wrist
//! - **Thumbs up**: thumb tip farther than 0.05 m, other tips within 0.15 m
//!
//! ## Motions
//!
//! Read from a hand's [`MotionWindow`](handsign_core::MotionWindow):
//!
//! - **Shake**: at least 3 consecutive-sample speeds above 0.05 m/s
//! - **Wave**: a shake while the same hand is not a fist
//!
//! Missing joints and short histories make a predicate `false`; classifiers
//! never return errors.

pub mod motion;
pub mod pose;

pub use motion::*;
pub use pose::*;
