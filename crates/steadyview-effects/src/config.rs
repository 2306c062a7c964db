//! Stabilizer configuration, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use steadyview_core::{Result, StabilizeError};
use steadyview_tracking::{BlockMatchConfig, StabilizationParams, MAX_SMOOTHING_STRENGTH};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    pub params: StabilizationParams,
    pub estimator: BlockMatchConfig,
    /// Vectors below this confidence move the camera path by zero.
    pub min_confidence: f32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            params: StabilizationParams::default(),
            estimator: BlockMatchConfig::default(),
            min_confidence: 0.2,
        }
    }
}

impl StabilizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.params.smoothing_strength > MAX_SMOOTHING_STRENGTH {
            return Err(StabilizeError::Config(format!(
                "smoothing_strength must be at most {MAX_SMOOTHING_STRENGTH}, got {}",
                self.params.smoothing_strength
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(StabilizeError::Config(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        self.estimator.validate()
    }

    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), "Stabilizer configuration loaded");
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
