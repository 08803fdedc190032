// SPDX-License-Identifier: MPL-2.0
//! Decoded frames and canvas measurements.

use std::sync::Arc;

/// Bytes per decoded pixel (RGBA8).
pub const BYTES_PER_PIXEL: u64 = 4;

/// Pixel dimensions of a bitmap or an animation canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if either dimension is zero.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels on the canvas.
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Memory needed to hold one decoded RGBA frame of this size.
    #[must_use]
    pub fn frame_bytes(self) -> u64 {
        self.pixel_count() * BYTES_PER_PIXEL
    }
}

/// A decoded frame ready for display.
///
/// Pixel data is reference-counted so the cache, the playback driver and any
/// renderer can hold the same frame without copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// RGBA pixel data (width × height × 4 bytes).
    pub rgba_data: Arc<Vec<u8>>,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,
}

impl DecodedFrame {
    /// Wraps RGBA pixels in a frame.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            rgba_data: Arc::new(pixels),
            width,
            height,
        }
    }

    /// Returns the total size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.rgba_data.len()
    }

    /// Returns true if the frame holds no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rgba_data.is_empty() || self.size().is_empty()
    }

    #[must_use]
    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }
}

/// Anything that can report the layout size it occupies.
///
/// Implemented by standalone [`DecodedFrame`]s and by animated sources so
/// layout code can measure either without caring which one it holds.
pub trait CanvasSized {
    fn canvas_size(&self) -> CanvasSize;
}

impl CanvasSized for DecodedFrame {
    fn canvas_size(&self) -> CanvasSize {
        self.size()
    }
}

impl<T: CanvasSized + ?Sized> CanvasSized for Arc<T> {
    fn canvas_size(&self) -> CanvasSize {
        (**self).canvas_size()
    }
}

/// Returns the canvas size of a still frame or an animated source.
#[must_use]
pub fn size_for_image(image: &dyn CanvasSized) -> CanvasSize {
    image.canvas_size()
}
