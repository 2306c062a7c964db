//! Camera path smoothing for translation-only stabilization.
//!
//! Raw per-frame motion is integrated into a cumulative camera path and
//! followed by an exponential moving average. The correction for a frame is
//! the gap between the smoothed and the cumulative position.

use crate::block_match::MotionVector;
use serde::{Deserialize, Serialize};
use steadyview_core::Vec2;
use tracing::trace;

/// Smoothing coefficient reached at strength 100.
const MAX_ALPHA: f32 = 0.98;

/// Highest accepted smoothing strength.
pub const MAX_SMOOTHING_STRENGTH: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizationParams {
    pub enabled: bool,
    /// 0 disables smoothing, 100 is the heaviest.
    pub smoothing_strength: u8,
    /// Border width, in pixels, forced to black after warping.
    pub crop_amount: u32,
}

impl Default for StabilizationParams {
    fn default() -> Self {
        Self {
            enabled: true,
            smoothing_strength: 50,
            crop_amount: 0,
        }
    }
}

/// Smoother output for one frame. Confidence is carried over from the raw
/// vector and does not influence the filter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PathCorrection {
    pub dx: f32,
    pub dy: f32,
    pub confidence: f32,
}

impl PathCorrection {
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.dx, self.dy)
    }

    /// Warp input that moves the picture from the raw path onto the
    /// smoothed one. The warp samples at `x + dx`, so the sign flips.
    pub fn into_warp(self, crop_amount: u32) -> Correction {
        Correction {
            dx: -self.dx,
            dy: -self.dy,
            crop_amount,
        }
    }
}

/// What the warp renderer consumes: output pixel `(x, y)` samples the
/// source at `(x + dx, y + dy)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Correction {
    pub dx: f32,
    pub dy: f32,
    pub crop_amount: u32,
}

impl Correction {
    pub const IDENTITY: Self = Self {
        dx: 0.0,
        dy: 0.0,
        crop_amount: 0,
    };

    pub fn new(dx: f32, dy: f32, crop_amount: u32) -> Self {
        Self {
            dx,
            dy,
            crop_amount,
        }
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.dx, self.dy)
    }

    pub fn is_identity(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0 && self.crop_amount == 0
    }
}

/// EMA coefficient for a smoothing strength: 0 at strength 0, rising
/// linearly to [`MAX_ALPHA`] at 100.
pub fn smoothing_alpha(strength: u8) -> f32 {
    let s = strength.min(MAX_SMOOTHING_STRENGTH) as f32;
    MAX_ALPHA * s / MAX_SMOOTHING_STRENGTH as f32
}

/// Streaming smoothing session. Vectors must be pushed in frame order;
/// call [`PathSmoother::reset`] on seeks and scene changes.
#[derive(Debug, Clone)]
pub struct PathSmoother {
    alpha: f32,
    cumulative: Vec2,
    smoothed: Vec2,
    frames: usize,
}

impl PathSmoother {
    pub fn new(smoothing_strength: u8) -> Self {
        Self {
            alpha: smoothing_alpha(smoothing_strength),
            cumulative: Vec2::ZERO,
            smoothed: Vec2::ZERO,
            frames: 0,
        }
    }

    /// Change the strength without dropping the path.
    pub fn set_strength(&mut self, smoothing_strength: u8) {
        self.alpha = smoothing_alpha(smoothing_strength);
    }

    /// Number of frames pushed since construction or the last reset.
    pub fn len(&self) -> usize {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn reset(&mut self) {
        self.cumulative = Vec2::ZERO;
        self.smoothed = Vec2::ZERO;
        self.frames = 0;
    }

    /// Feed the next raw vector and get that frame's correction.
    pub fn push(&mut self, vector: &MotionVector) -> PathCorrection {
        self.cumulative += vector.offset();
        if self.frames == 0 {
            // Nothing to smooth against yet.
            self.smoothed = self.cumulative;
        } else {
            self.smoothed = self.cumulative + self.alpha * (self.smoothed - self.cumulative);
        }
        self.frames += 1;

        let correction = if self.alpha == 0.0 {
            Vec2::ZERO
        } else {
            self.smoothed - self.cumulative
        };
        trace!(
            frame = self.frames - 1,
            cum_x = self.cumulative.x,
            cum_y = self.cumulative.y,
            smooth_x = self.smoothed.x,
            smooth_y = self.smoothed.y,
            "Path smoothed"
        );
        PathCorrection {
            dx: correction.x,
            dy: correction.y,
            confidence: vector.confidence,
        }
    }
}

/// Smooth a whole motion history in one pass. The output has one
/// correction per input vector.
pub fn smooth_motion_path(vectors: &[MotionVector], smoothing_strength: u8) -> Vec<PathCorrection> {
    let mut smoother = PathSmoother::new(smoothing_strength);
    vectors.iter().map(|v| smoother.push(v)).collect()
}
