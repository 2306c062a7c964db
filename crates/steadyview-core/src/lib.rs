//! SteadyView Core - Foundation types for the stabilizer
//!
//! This crate provides the types shared by every stabilization stage:
//! - RGBA8 frame buffers handed over by the host pipeline
//! - The error type for construction and configuration surfaces
//! - Geometric primitives

pub mod error;
pub mod frame;

pub use error::{Result, StabilizeError};
pub use frame::{FrameBuffer, Rgba, BYTES_PER_PIXEL, OPAQUE_BLACK};

/// 2D vector.
pub type Vec2 = glam::Vec2;
