//! # Handsign-Engine
//!
//! Turns a stream of per-hand skeleton frames into a debounced stream of
//! gestures.
//!
//! ## Stages
//!
//! 1. **Acquisition**: frames arrive from a [`HandFrameSource`] (live channel
//!    or recorded replay)
//! 2. **Classification**: the [`ClassificationOrchestrator`] updates the
//!    hand's motion window and evaluates pose and motion detectors for both
//!    hands in a fixed order
//! 3. **Wiring**: the first detection the [`WiringPolicy`] maps to a gesture
//!    drives the state machine
//! 4. **Debounce**: the [`GestureStateMachine`] holds that gesture for
//!    `debounce_secs` after its last detection, then clears it
//!
//! [`GesturePipeline`] runs these stages on one tokio task;
//! [`GestureStreamProcessor`] runs them inline with callbacks.

pub mod acquisition;
pub mod config;
pub mod orchestrator;
pub mod pipeline;
pub mod state_machine;

pub use acquisition::*;
pub use self::config::*;
pub use orchestrator::*;
pub use pipeline::*;
pub use state_machine::*;
