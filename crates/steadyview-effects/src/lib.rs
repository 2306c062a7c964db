//! SteadyView Effects - CPU rendering stages for stabilized preview
//!
//! Provides the stabilizing warp renderer and the `StabilizeEffect` session
//! that a host render pipeline drives once per frame.

pub mod config;
pub mod stabilize_effect;
pub mod warp;

pub use config::StabilizerConfig;
pub use stabilize_effect::StabilizeEffect;
pub use warp::{apply_crop, apply_stabilization, stabilized, translate};

use serde::{Deserialize, Serialize};
use steadyview_core::{FrameBuffer, Result, StabilizeError};

/// Effect parameter types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    Bool(bool),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view; floats are rounded.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() => Some(f.round() as i32),
            _ => None,
        }
    }
}

/// Effect parameter descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    pub display_name: String,
    pub default: ParamValue,
    pub min: Option<ParamValue>,
    pub max: Option<ParamValue>,
}

impl ParamDescriptor {
    /// Read this parameter as a bool, falling back to `fallback` when absent.
    pub fn read_bool(&self, values: &ParamValues, fallback: bool) -> Result<bool> {
        match values.get(&self.name) {
            None => Ok(fallback),
            Some(v) => v.as_bool().ok_or_else(|| self.type_error("a bool", v)),
        }
    }

    /// Read this parameter as an integer clamped to the descriptor's range.
    pub fn read_int(&self, values: &ParamValues, fallback: i32) -> Result<i32> {
        let raw = match values.get(&self.name) {
            None => return Ok(fallback),
            Some(v) => v.as_int().ok_or_else(|| self.type_error("an integer", v))?,
        };
        let lo = self.min.as_ref().and_then(ParamValue::as_int).unwrap_or(i32::MIN);
        let hi = self.max.as_ref().and_then(ParamValue::as_int).unwrap_or(i32::MAX);
        Ok(raw.clamp(lo, hi))
    }

    fn type_error(&self, expected: &str, got: &ParamValue) -> StabilizeError {
        StabilizeError::InvalidParameter(format!(
            "{} must be {expected}, got {got:?}",
            self.name
        ))
    }
}

/// Collection of parameter values.
pub type ParamValues = std::collections::HashMap<String, ParamValue>;

/// Trait for CPU frame effects driven by the host pipeline.
pub trait FrameEffect: Send {
    /// Get the effect name.
    fn name(&self) -> &str;

    /// Get parameter descriptors.
    fn params(&self) -> &[ParamDescriptor];

    /// Render `input` into `output`, which must have the same geometry.
    fn render(
        &mut self,
        input: &FrameBuffer,
        output: &mut FrameBuffer,
        params: &ParamValues,
    ) -> Result<()>;
}
