//! Engine configuration.

use std::path::Path;

use handsign_classify::{MotionThresholds, PoseThresholds};
use handsign_core::{Error, Result, MOTION_WINDOW_CAPACITY};
use serde::{Deserialize, Serialize};

use crate::orchestrator::WiringPolicy;
use crate::state_machine::DEFAULT_DEBOUNCE_SECS;

const ENV_PREFIX: &str = "HANDSIGN";

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Samples kept per hand
    pub window_capacity: usize,

    /// Fingertip distance thresholds
    pub pose: PoseThresholds,

    /// Shake/wave thresholds
    pub motion: MotionThresholds,

    /// Seconds a gesture stays active after its last detection
    pub debounce_secs: f64,

    /// Detector to gesture routing
    pub wiring: WiringPolicy,

    /// Output channel size for the streaming pipeline
    pub output_queue_size: usize,

    /// Expiry poll interval (milliseconds) while no frames arrive
    pub expiry_poll_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_capacity: MOTION_WINDOW_CAPACITY,
            pose: PoseThresholds::default(),
            motion: MotionThresholds::default(),
            debounce_secs: DEFAULT_DEBOUNCE_SECS,
            wiring: WiringPolicy::default(),
            output_queue_size: 256,
            expiry_poll_ms: 50,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file, with `HANDSIGN_*` environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Self::finish(settings)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Self::finish(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_capacity == 0 {
            return Err(Error::Config("window_capacity must be at least 1".into()));
        }
        if self.debounce_secs.is_nan() || self.debounce_secs <= 0.0 {
            return Err(Error::Config(format!(
                "debounce_secs must be positive, got {}",
                self.debounce_secs
            )));
        }
        if self.output_queue_size == 0 {
            return Err(Error::Config("output_queue_size must be at least 1".into()));
        }
        Ok(())
    }

    fn finish(settings: config::Config) -> Result<Self> {
        let config: Self = settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// `HANDSIGN_DEBOUNCE_SECS`, `HANDSIGN_POSE__FIST_M`, ...
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
