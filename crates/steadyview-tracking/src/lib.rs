//! SteadyView Tracking - Motion estimation and camera path smoothing.

pub mod block_match;
pub mod luma;
pub mod robust;
pub mod stabilize;

pub use block_match::{
    compute_motion_vector, partition_blocks, Block, BlockMatchConfig, BlockMatcher, MotionVector,
};
pub use luma::{downsample, to_grayscale, LumaImage};
pub use robust::{filter_outliers, filter_outliers_with, median, median_absolute_deviation};
pub use stabilize::{
    smooth_motion_path, smoothing_alpha, Correction, PathCorrection, PathSmoother,
    StabilizationParams, MAX_SMOOTHING_STRENGTH,
};
