//! Translation warp with bilinear resampling and a black crop border.
//!
//! Output geometry always equals input geometry. Pixel `(x, y)` of the output
//! samples the source at `(x + dx, y + dy)` with a top-left origin; samples
//! that fall outside the source become opaque black.

use rayon::prelude::*;
use steadyview_core::{FrameBuffer, Rgba, BYTES_PER_PIXEL, OPAQUE_BLACK};
use steadyview_tracking::Correction;

/// Source taps along one axis: `(i0, i1, frac)`. Integer positions use a
/// single tap (`i0 == i1`, `frac == 0`).
type AxisTaps = Option<(usize, usize, f32)>;

fn axis_taps(pos: f32, len: u32) -> AxisTaps {
    if !pos.is_finite() {
        return None;
    }
    let base = pos.floor();
    if base < 0.0 || base >= len as f32 {
        return None;
    }
    let i0 = base as usize;
    let frac = pos - base;
    if frac == 0.0 {
        return Some((i0, i0, 0.0));
    }
    let i1 = i0 + 1;
    if i1 >= len as usize {
        return None;
    }
    Some((i0, i1, frac))
}

#[inline]
fn lerp_pixel(a: Rgba, b: Rgba, t: f32) -> [f32; 4] {
    let mut out = [0.0f32; 4];
    for c in 0..4 {
        out[c] = a[c] as f32 * (1.0 - t) + b[c] as f32 * t;
    }
    out
}

/// Translate a frame by sampling at `(x + dx, y + dy)`.
pub fn translate(frame: &FrameBuffer, dx: f32, dy: f32) -> FrameBuffer {
    let (w, h) = (frame.width, frame.height);
    let mut out = FrameBuffer::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let cols: Vec<AxisTaps> = (0..w).map(|x| axis_taps(x as f32 + dx, w)).collect();
    let rows: Vec<AxisTaps> = (0..h).map(|y| axis_taps(y as f32 + dy, h)).collect();
    let src = frame.pixels();
    let stride = w as usize;

    out.data
        .par_chunks_mut(stride * BYTES_PER_PIXEL)
        .zip(rows.par_iter())
        .for_each(|(row_out, row_taps)| {
            let Some((y0, y1, fy)) = *row_taps else {
                return; // already opaque black
            };
            for (x, col_taps) in cols.iter().enumerate() {
                let Some((x0, x1, fx)) = *col_taps else {
                    continue;
                };
                let px = if fx == 0.0 && fy == 0.0 {
                    src[y0 * stride + x0]
                } else {
                    let top = lerp_pixel(src[y0 * stride + x0], src[y0 * stride + x1], fx);
                    let bottom = lerp_pixel(src[y1 * stride + x0], src[y1 * stride + x1], fx);
                    let mut px = [0u8; 4];
                    for c in 0..4 {
                        let v = top[c] * (1.0 - fy) + bottom[c] * fy;
                        px[c] = v.round().clamp(0.0, 255.0) as u8;
                    }
                    px
                };
                let i = x * BYTES_PER_PIXEL;
                row_out[i..i + BYTES_PER_PIXEL].copy_from_slice(&px);
            }
        });
    out
}

/// Force every pixel within `crop` pixels of an edge to opaque black.
///
/// When the borders meet (`2 * crop >= min(width, height)`) the whole frame
/// turns black.
pub fn apply_crop(frame: &mut FrameBuffer, crop: u32) {
    if crop == 0 {
        return;
    }
    let (w, h) = (frame.width, frame.height);
    if crop as u64 * 2 >= w.min(h) as u64 {
        frame.fill(OPAQUE_BLACK);
        return;
    }
    let stride = w as usize;
    let c = crop as usize;
    let pixels = frame.pixels_mut();
    for (y, row) in pixels.chunks_mut(stride).enumerate() {
        if y < c || y >= h as usize - c {
            row.fill(OPAQUE_BLACK);
        } else {
            row[..c].fill(OPAQUE_BLACK);
            row[stride - c..].fill(OPAQUE_BLACK);
        }
    }
}

/// Warp and crop into a new frame, leaving the input untouched.
pub fn stabilized(frame: &FrameBuffer, correction: &Correction) -> FrameBuffer {
    let mut out = if correction.dx == 0.0 && correction.dy == 0.0 {
        frame.clone()
    } else {
        translate(frame, correction.dx, correction.dy)
    };
    apply_crop(&mut out, correction.crop_amount);
    out
}

/// Warp and crop in place. An identity correction leaves the bytes untouched.
pub fn apply_stabilization(frame: &mut FrameBuffer, correction: &Correction) {
    if correction.is_identity() {
        return;
    }
    if correction.dx != 0.0 || correction.dy != 0.0 {
        *frame = translate(frame, correction.dx, correction.dy);
    }
    apply_crop(frame, correction.crop_amount);
}
