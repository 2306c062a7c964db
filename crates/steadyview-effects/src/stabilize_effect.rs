//! Per-frame stabilization session for the host render pipeline.
//!
//! Each call estimates the motion of the incoming frame against the previous
//! one, extends the camera path, smooths it and warps the frame onto the
//! smoothed path. The session owns the only mutable state in the chain.

use crate::config::StabilizerConfig;
use crate::warp::stabilized;
use crate::{FrameEffect, ParamDescriptor, ParamValue, ParamValues};
use steadyview_core::{FrameBuffer, Result, StabilizeError};
use steadyview_tracking::{
    BlockMatcher, Correction, LumaImage, MotionVector, PathSmoother, StabilizationParams,
    MAX_SMOOTHING_STRENGTH,
};
use tracing::{debug, info};

const PARAM_ENABLED: &str = "enabled";
const PARAM_STRENGTH: &str = "smoothing_strength";
const PARAM_CROP: &str = "crop_amount";

/// Luminance of the last frame plus the geometry it came from.
struct Reference {
    width: u32,
    height: u32,
    luma: LumaImage,
}

/// Stabilize preview effect.
pub struct StabilizeEffect {
    config: StabilizerConfig,
    matcher: BlockMatcher,
    smoother: PathSmoother,
    reference: Option<Reference>,
    history: Vec<MotionVector>,
    last_correction: Correction,
    descriptors: Vec<ParamDescriptor>,
}

impl StabilizeEffect {
    pub fn new(config: StabilizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            matcher: BlockMatcher::new(config.estimator.clone()),
            smoother: PathSmoother::new(config.params.smoothing_strength),
            reference: None,
            history: Vec::new(),
            last_correction: Correction::IDENTITY,
            descriptors: Self::descriptors(&config.params),
            config,
        })
    }

    fn descriptors(defaults: &StabilizationParams) -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor {
                name: PARAM_ENABLED.into(),
                display_name: "Stabilize Preview".into(),
                default: ParamValue::Bool(defaults.enabled),
                min: None,
                max: None,
            },
            ParamDescriptor {
                name: PARAM_STRENGTH.into(),
                display_name: "Smoothing".into(),
                default: ParamValue::Int(defaults.smoothing_strength as i32),
                min: Some(ParamValue::Int(0)),
                max: Some(ParamValue::Int(MAX_SMOOTHING_STRENGTH as i32)),
            },
            ParamDescriptor {
                name: PARAM_CROP.into(),
                display_name: "Crop".into(),
                default: ParamValue::Int(defaults.crop_amount.min(i32::MAX as u32) as i32),
                min: Some(ParamValue::Int(0)),
                max: None,
            },
        ]
    }

    pub fn stabilization_params(&self) -> &StabilizationParams {
        &self.config.params
    }

    /// Update the user-facing parameters. The camera path is kept.
    pub fn set_params(&mut self, params: StabilizationParams) {
        let strength = params.smoothing_strength.min(MAX_SMOOTHING_STRENGTH);
        self.smoother.set_strength(strength);
        self.config.params = StabilizationParams {
            smoothing_strength: strength,
            ..params
        };
    }

    /// Drop all path state, e.g. after a seek or a scene change.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.reference = None;
        self.history.clear();
        self.last_correction = Correction::IDENTITY;
    }

    /// Raw motion vectors since the last reset, in frame order.
    pub fn history(&self) -> &[MotionVector] {
        &self.history
    }

    pub fn last_correction(&self) -> Correction {
        self.last_correction
    }

    /// Stabilize the next frame in playback order.
    pub fn process(&mut self, frame: &FrameBuffer) -> FrameBuffer {
        if !self.config.params.enabled {
            if !self.history.is_empty() {
                self.reset();
            }
            return frame.clone();
        }

        if let Some(r) = &self.reference {
            if r.width != frame.width || r.height != frame.height {
                info!(
                    from = ?(r.width, r.height),
                    to = ?(frame.width, frame.height),
                    "Frame geometry changed, resetting stabilization"
                );
                self.reset();
            }
        }

        let luma = self.matcher.reduce(frame);
        let raw = match &self.reference {
            Some(r) if self.matcher.fits(frame.width, frame.height) => {
                self.matcher.estimate_reduced(&luma, &r.luma)
            }
            _ => MotionVector::ZERO,
        };
        self.history.push(raw);

        let effective = if raw.confidence < self.config.min_confidence {
            MotionVector {
                dx: 0.0,
                dy: 0.0,
                confidence: raw.confidence,
            }
        } else {
            raw
        };
        let correction = self
            .smoother
            .push(&effective)
            .into_warp(self.config.params.crop_amount);
        debug!(
            frame = self.history.len() - 1,
            raw_dx = raw.dx,
            raw_dy = raw.dy,
            confidence = raw.confidence,
            warp_dx = correction.dx,
            warp_dy = correction.dy,
            "Stabilization correction"
        );

        self.reference = Some(Reference {
            width: frame.width,
            height: frame.height,
            luma,
        });
        self.last_correction = correction;
        stabilized(frame, &correction)
    }
}

impl FrameEffect for StabilizeEffect {
    fn name(&self) -> &str {
        "Stabilize"
    }

    fn params(&self) -> &[ParamDescriptor] {
        &self.descriptors
    }

    fn render(
        &mut self,
        input: &FrameBuffer,
        output: &mut FrameBuffer,
        params: &ParamValues,
    ) -> Result<()> {
        input.validate()?;
        output.validate()?;
        if !input.same_size(output) {
            return Err(StabilizeError::DimensionMismatch {
                expected: format!("{}x{}", input.width, input.height),
                got: format!("{}x{}", output.width, output.height),
            });
        }
        let current = self.config.params.clone();
        let next = StabilizationParams {
            enabled: self.descriptors[0].read_bool(params, current.enabled)?,
            smoothing_strength: self.descriptors[1]
                .read_int(params, current.smoothing_strength as i32)?
                as u8,
            crop_amount: self.descriptors[2]
                .read_int(params, current.crop_amount.min(i32::MAX as u32) as i32)?
                as u32,
        };
        if next != current {
            self.set_params(next);
        }
        let rendered = self.process(input);
        output.data.copy_from_slice(&rendered.data);
        Ok(())
    }
}
