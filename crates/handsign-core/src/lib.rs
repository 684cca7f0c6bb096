//! # Handsign-Core
//!
//! Core types and utilities for the handsign gesture classification
//! pipeline: the hand-skeleton snapshot model fed in by the acquisition side,
//! transform geometry, and the bounded per-hand motion window.

pub mod error;
pub mod geometry;
pub mod motion;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use motion::*;
pub use types::*;
