//! Luminance reduction for block matching.

use steadyview_core::FrameBuffer;

/// Rec.709 luma weights.
const REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// A single-channel brightness image stored as f32 values in the 0-255 domain.
#[derive(Debug, Clone, PartialEq)]
pub struct LumaImage {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl LumaImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0.0; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Reduce an RGBA8 frame to luminance.
    pub fn from_frame(frame: &FrameBuffer) -> Self {
        to_grayscale(&frame.data, frame.width, frame.height)
    }
}

/// Convert RGBA u8 frame data to Rec.709 luminance, ignoring alpha.
///
/// Pixels missing from a short buffer read as zero.
pub fn to_grayscale(rgba: &[u8], width: u32, height: u32) -> LumaImage {
    let mut luma = LumaImage::new(width, height);
    for (i, out) in luma.data.iter_mut().enumerate() {
        let idx = i * 4;
        if idx + 2 < rgba.len() {
            *out = REC709[0] * rgba[idx] as f32
                + REC709[1] * rgba[idx + 1] as f32
                + REC709[2] * rgba[idx + 2] as f32;
        }
    }
    luma
}

/// Point-sample the top-left pixel of every `factor x factor` cell.
///
/// The output is `ceil(width / factor) x ceil(height / factor)`. A factor of
/// 0 or 1 returns a copy.
pub fn downsample(image: &LumaImage, factor: u32) -> LumaImage {
    if factor <= 1 {
        return image.clone();
    }
    let nw = image.width.div_ceil(factor);
    let nh = image.height.div_ceil(factor);
    let mut out = LumaImage::new(nw, nh);
    for y in 0..nh {
        let src_row = (y * factor) as usize * image.width as usize;
        for x in 0..nw {
            out.data[(y * nw + x) as usize] = image.data[src_row + (x * factor) as usize];
        }
    }
    out
}
