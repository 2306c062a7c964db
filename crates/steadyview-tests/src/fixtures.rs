//! Shared frame generators and test logging.

use std::sync::Once;
use steadyview_core::{FrameBuffer, OPAQUE_BLACK};
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
/// Filtering follows `RUST_LOG`.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Deterministic per-pixel hash texture.
pub fn noise(x: i32, y: i32, seed: u32) -> u8 {
    let mut h = (x as u32).wrapping_mul(0x9E37_79B1)
        ^ (y as u32).wrapping_mul(0x85EB_CA77)
        ^ seed.wrapping_mul(0xC2B2_AE3D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    (h & 0xFF) as u8
}

/// A textured scene viewed by a camera displaced by `(sx, sy)`: content
/// appears shifted right/down, and new content enters from the edges.
pub fn scene(width: u32, height: u32, sx: i32, sy: i32, seed: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let (u, v) = (x as i32 - sx, y as i32 - sy);
            let l = noise(u, v, seed);
            frame.set_pixel(x, y, [l, l.wrapping_add(40), 255 - l, 255]);
        }
    }
    frame
}

/// Copy `frame` shifted right/down by `(sx, sy)`, filling uncovered pixels
/// with opaque black.
pub fn shift_frame(frame: &FrameBuffer, sx: i32, sy: i32) -> FrameBuffer {
    let mut out = FrameBuffer::new(frame.width, frame.height);
    for y in 0..frame.height as i32 {
        for x in 0..frame.width as i32 {
            let (u, v) = (x - sx, y - sy);
            let px = if u >= 0 && v >= 0 && u < frame.width as i32 && v < frame.height as i32 {
                frame.pixel(u as u32, v as u32)
            } else {
                OPAQUE_BLACK
            };
            out.set_pixel(x as u32, y as u32, px);
        }
    }
    out
}

/// Top third red, rest blue, with a green marker column at x = 1.
pub fn asymmetric_pattern(width: u32, height: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let px = if x == 1 {
                [0, 255, 0, 255]
            } else if y < height / 3 {
                [255, 0, 0, 255]
            } else {
                [0, 0, 255, 255]
            };
            frame.set_pixel(x, y, px);
        }
    }
    frame
}

/// Population variance.
pub fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / values.len() as f32
}
