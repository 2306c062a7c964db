//! Global translation estimation by exhaustive block matching.
//!
//! The reference luminance is split into a grid of square blocks. Textured
//! blocks are searched for in the current frame over every integer offset in
//! the search window, and the per-block offsets are reduced to one vector with
//! outlier rejection and a median per axis.

use crate::luma::{downsample, LumaImage};
use crate::robust::{filter_outliers_with, median, DEFAULT_OUTLIER_THRESHOLD};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use steadyview_core::{FrameBuffer, Result, StabilizeError, Vec2};
use tracing::{debug, trace, warn};

/// Mean absolute difference (in luma levels) at which match quality drops to 0.5.
const QUALITY_SCALE: f32 = 8.0;

/// Apparent translation of the current frame relative to the reference.
///
/// `dx`/`dy` are positive when the current frame is shifted right/down.
/// `confidence` is in [0, 1]; a zero-confidence vector is always `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionVector {
    pub dx: f32,
    pub dy: f32,
    pub confidence: f32,
}

impl MotionVector {
    /// No motion, no evidence.
    pub const ZERO: Self = Self {
        dx: 0.0,
        dy: 0.0,
        confidence: 0.0,
    };

    /// Build a vector, clamping confidence and dropping the displacement when
    /// there is no confidence in it.
    pub fn new(dx: f32, dy: f32, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        if confidence == 0.0 {
            return Self::ZERO;
        }
        Self { dx, dy, confidence }
    }

    #[inline]
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.dx, self.dy)
    }
}

/// Tunables for [`BlockMatcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockMatchConfig {
    /// Block edge length in full-resolution pixels.
    pub block_size: u32,
    /// Maximum offset searched on each axis, in full-resolution pixels.
    pub search_range: u32,
    /// Blocks whose luma variance is below this are skipped.
    pub min_texture_variance: f32,
    /// Point-sampling factor applied before the search.
    pub downsample_factor: u32,
    /// Distance (in search pixels) within which a block agrees with the global vector.
    pub agreement_tolerance: f32,
    /// Outlier rejection multiple of the scaled MAD.
    pub outlier_threshold: f32,
    /// Search blocks on the rayon pool.
    pub parallel: bool,
}

impl Default for BlockMatchConfig {
    fn default() -> Self {
        Self {
            block_size: 16,
            search_range: 32,
            min_texture_variance: 4.0,
            downsample_factor: 1,
            agreement_tolerance: 1.5,
            outlier_threshold: DEFAULT_OUTLIER_THRESHOLD,
            parallel: true,
        }
    }
}

impl BlockMatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.block_size < 2 {
            return Err(StabilizeError::InvalidParameter(format!(
                "block_size must be at least 2, got {}",
                self.block_size
            )));
        }
        if self.downsample_factor == 0 {
            return Err(StabilizeError::InvalidParameter(
                "downsample_factor must be at least 1".into(),
            ));
        }
        if !(self.min_texture_variance >= 0.0 && self.min_texture_variance.is_finite()) {
            return Err(StabilizeError::InvalidParameter(format!(
                "min_texture_variance must be a non-negative number, got {}",
                self.min_texture_variance
            )));
        }
        if !(self.agreement_tolerance >= 0.0 && self.agreement_tolerance.is_finite()) {
            return Err(StabilizeError::InvalidParameter(format!(
                "agreement_tolerance must be a non-negative number, got {}",
                self.agreement_tolerance
            )));
        }
        if !(self.outlier_threshold >= 1.0 && self.outlier_threshold.is_finite()) {
            return Err(StabilizeError::InvalidParameter(format!(
                "outlier_threshold must be at least 1, got {}",
                self.outlier_threshold
            )));
        }
        Ok(())
    }
}

/// A square search unit in the reference image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub bx: u32,
    pub by: u32,
    pub size: u32,
    /// Luma variance inside the block.
    pub texture: f32,
}

/// Best offset found for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BlockMatch {
    dx: i32,
    dy: i32,
    /// 1 for a perfect match, falling toward 0 as the residual grows.
    quality: f32,
}

/// Split an image into a non-overlapping grid of `size x size` blocks.
///
/// Partial blocks at the right and bottom edges are dropped.
pub fn partition_blocks(image: &LumaImage, size: u32) -> Vec<Block> {
    if size == 0 || image.width < size || image.height < size {
        return Vec::new();
    }
    let mut blocks = Vec::new();
    for by in (0..=image.height - size).step_by(size as usize) {
        for bx in (0..=image.width - size).step_by(size as usize) {
            blocks.push(Block {
                bx,
                by,
                size,
                texture: block_variance(image, bx, by, size),
            });
        }
    }
    blocks
}

fn block_variance(image: &LumaImage, bx: u32, by: u32, size: u32) -> f32 {
    let w = image.width as usize;
    let n = (size * size) as f64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in by..by + size {
        let row = &image.data[y as usize * w + bx as usize..][..size as usize];
        for &v in row {
            sum += v as f64;
            sum_sq += (v as f64) * (v as f64);
        }
    }
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0) as f32
}

/// Mean absolute difference between a reference block and the current-frame
/// window displaced by `(ddx, ddy)`, over in-bounds samples only.
///
/// Returns `None` when fewer than half of the block's samples are in bounds.
fn window_score(
    current: &LumaImage,
    reference: &LumaImage,
    block: &Block,
    ddx: i32,
    ddy: i32,
) -> Option<f32> {
    let size = block.size as i32;
    let cx = block.bx as i32 + ddx;
    let cy = block.by as i32 + ddy;

    let i_lo = (-cx).max(0);
    let i_hi = (current.width as i32 - cx).min(size);
    let j_lo = (-cy).max(0);
    let j_hi = (current.height as i32 - cy).min(size);
    if i_hi <= i_lo || j_hi <= j_lo {
        return None;
    }
    let count = ((i_hi - i_lo) * (j_hi - j_lo)) as usize;
    if count * 2 < (size * size) as usize {
        return None;
    }

    let cw = current.width as usize;
    let rw = reference.width as usize;
    let span = (i_hi - i_lo) as usize;
    let mut sad = 0.0f32;
    for j in j_lo..j_hi {
        let r_start = (block.by as i32 + j) as usize * rw + (block.bx as i32 + i_lo) as usize;
        let c_start = (cy + j) as usize * cw + (cx + i_lo) as usize;
        let r_row = &reference.data[r_start..r_start + span];
        let c_row = &current.data[c_start..c_start + span];
        sad += r_row
            .iter()
            .zip(c_row)
            .map(|(r, c)| (r - c).abs())
            .sum::<f32>();
    }
    Some(sad / count as f32)
}

/// Full search over `|ddx|, |ddy| <= range` for one block.
fn search_block(
    current: &LumaImage,
    reference: &LumaImage,
    block: &Block,
    range: i32,
) -> Option<BlockMatch> {
    let mut best: Option<(f32, i32, i32)> = None;
    for ddy in -range..=range {
        for ddx in -range..=range {
            let Some(score) = window_score(current, reference, block, ddx, ddy) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((best_score, bdx, bdy)) => {
                    score < best_score
                        || (score == best_score
                            && ddx.abs() + ddy.abs() < bdx.abs() + bdy.abs())
                }
            };
            if better {
                best = Some((score, ddx, ddy));
            }
        }
    }
    best.map(|(score, dx, dy)| BlockMatch {
        dx,
        dy,
        quality: 1.0 / (1.0 + score / QUALITY_SCALE),
    })
}

/// Configurable block-matching motion estimator.
#[derive(Debug, Clone, Default)]
pub struct BlockMatcher {
    config: BlockMatchConfig,
}

impl BlockMatcher {
    pub fn new(config: BlockMatchConfig) -> Self {
        Self { config }
    }

    /// True when a frame of this size holds at least one block.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        let block_size = self.config.block_size;
        block_size > 0 && width >= block_size && height >= block_size
    }

    /// Reduce a frame to the luminance resolution the search runs at.
    pub fn reduce(&self, frame: &FrameBuffer) -> LumaImage {
        let luma = LumaImage::from_frame(frame);
        match self.config.downsample_factor {
            0 | 1 => luma,
            factor => downsample(&luma, factor),
        }
    }

    /// Estimate the translation of `current` relative to `reference`.
    ///
    /// Never fails: mismatched or undersized frames and frames without
    /// usable texture produce [`MotionVector::ZERO`].
    pub fn estimate(&self, current: &FrameBuffer, reference: &FrameBuffer) -> MotionVector {
        if !current.same_size(reference) {
            warn!(
                current = ?(current.width, current.height),
                reference = ?(reference.width, reference.height),
                "Frame size mismatch, skipping motion estimation"
            );
            return MotionVector::ZERO;
        }
        if !self.fits(current.width, current.height) {
            debug!(
                width = current.width,
                height = current.height,
                block_size = self.config.block_size,
                "Frame smaller than one block"
            );
            return MotionVector::ZERO;
        }
        self.estimate_reduced(&self.reduce(current), &self.reduce(reference))
    }

    /// Estimate on luminance already produced by [`BlockMatcher::reduce`],
    /// so callers can keep the reference luminance between frames. The
    /// result is in full-resolution pixels.
    pub fn estimate_reduced(&self, current: &LumaImage, reference: &LumaImage) -> MotionVector {
        if current.width != reference.width || current.height != reference.height {
            warn!("Luma size mismatch, skipping motion estimation");
            return MotionVector::ZERO;
        }
        let factor = self.config.downsample_factor.max(1);
        let size = (self.config.block_size / factor).max(1);
        if self.config.block_size == 0 || current.width < size || current.height < size {
            return MotionVector::ZERO;
        }
        let range = self.config.search_range / factor;

        let mv = self.match_luma(current, reference, size, range);
        MotionVector::new(mv.dx * factor as f32, mv.dy * factor as f32, mv.confidence)
    }

    fn match_luma(
        &self,
        current: &LumaImage,
        reference: &LumaImage,
        size: u32,
        range: u32,
    ) -> MotionVector {
        let blocks = partition_blocks(reference, size);
        let total = blocks.len();
        let min_texture = self.config.min_texture_variance;
        let retained: Vec<Block> = blocks
            .into_iter()
            .filter(|b| b.texture > 0.0 && b.texture >= min_texture)
            .collect();

        if retained.is_empty() {
            debug!(blocks = total, "No textured blocks, no motion evidence");
            return MotionVector::ZERO;
        }

        let range = range.min(i32::MAX as u32) as i32;
        let matches: Vec<BlockMatch> = if self.config.parallel {
            retained
                .par_iter()
                .filter_map(|b| search_block(current, reference, b, range))
                .collect()
        } else {
            retained
                .iter()
                .filter_map(|b| search_block(current, reference, b, range))
                .collect()
        };
        if matches.is_empty() {
            return MotionVector::ZERO;
        }

        let dxs: Vec<f32> = matches.iter().map(|m| m.dx as f32).collect();
        let dys: Vec<f32> = matches.iter().map(|m| m.dy as f32).collect();
        let dx = median(&filter_outliers_with(&dxs, self.config.outlier_threshold));
        let dy = median(&filter_outliers_with(&dys, self.config.outlier_threshold));

        let tol = self.config.agreement_tolerance;
        let agreeing: Vec<&BlockMatch> = matches
            .iter()
            .filter(|m| (m.dx as f32 - dx).abs() <= tol && (m.dy as f32 - dy).abs() <= tol)
            .collect();
        let confidence = if agreeing.is_empty() {
            0.0
        } else {
            let agreement = agreeing.len() as f32 / matches.len() as f32;
            let quality =
                agreeing.iter().map(|m| m.quality).sum::<f32>() / agreeing.len() as f32;
            agreement * quality
        };

        for m in &matches {
            trace!(dx = m.dx, dy = m.dy, quality = m.quality, "Block match");
        }
        debug!(
            blocks = total,
            retained = matches.len(),
            agreeing = agreeing.len(),
            dx,
            dy,
            confidence,
            "Motion estimated"
        );
        MotionVector::new(dx, dy, confidence)
    }
}

/// Estimate the translation of `current` relative to `reference` with the
/// default thresholds. Typical arguments are `block_size = 16` and
/// `search_range = 32`.
pub fn compute_motion_vector(
    current: &FrameBuffer,
    reference: &FrameBuffer,
    block_size: u32,
    search_range: u32,
) -> MotionVector {
    BlockMatcher::new(BlockMatchConfig {
        block_size,
        search_range,
        ..Default::default()
    })
    .estimate(current, reference)
}
