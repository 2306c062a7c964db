//! Frame buffer type for video frames in CPU memory.
//!
//! Frames are tightly packed RGBA8, row-major with a top-left origin. There
//! is no row padding, so `data.len() == width * height * 4` always holds.

use crate::error::{Result, StabilizeError};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// One RGBA8 pixel.
pub type Rgba = [u8; 4];

/// Opaque black, used for out-of-bounds samples and crop borders.
pub const OPAQUE_BLACK: Rgba = [0, 0, 0, 255];

/// A video frame in CPU memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Packed RGBA8 pixel data
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Create an opaque black frame with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        let mut frame = Self {
            width,
            height,
            data: vec![0u8; Self::byte_len(width, height)],
        };
        frame.fill(OPAQUE_BLACK);
        frame
    }

    /// Wrap existing RGBA8 bytes, checking that the length matches the geometry.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(StabilizeError::DimensionMismatch {
                expected: format!("{expected} bytes for {width}x{height} RGBA8"),
                got: format!("{} bytes", data.len()),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Number of bytes a packed RGBA8 frame of this size occupies.
    #[inline]
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    /// Check that `data` still holds exactly `width * height` packed pixels.
    ///
    /// The fields are public, so a caller can resize `data` behind the
    /// geometry's back.
    pub fn validate(&self) -> Result<()> {
        let expected = self.pixel_count() * BYTES_PER_PIXEL;
        if self.data.len() != expected {
            return Err(StabilizeError::InvalidFrame(format!(
                "{}x{} RGBA8 frame holds {} bytes, expected {expected}",
                self.width,
                self.height,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Number of pixels in the frame.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when both frames share the same width and height.
    #[inline]
    pub fn same_size(&self, other: &FrameBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of range");
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    /// Read the pixel at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels()[self.offset(x, y) / BYTES_PER_PIXEL]
    }

    /// Write the pixel at `(x, y)`.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: Rgba) {
        let i = self.offset(x, y);
        self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    /// Typed view of the pixel data.
    #[inline]
    pub fn pixels(&self) -> &[Rgba] {
        bytemuck::cast_slice(&self.data)
    }

    /// Mutable typed view of the pixel data.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Set every pixel to the same value.
    pub fn fill(&mut self, rgba: Rgba) {
        self.pixels_mut().fill(rgba);
    }
}
