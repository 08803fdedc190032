// SPDX-License-Identifier: MPL-2.0
//! RGBA canvas shared by the compositing codecs.
//!
//! GIF and animated WebP store frames as sub-rectangles drawn on top of the
//! previous canvas state. The codecs own the disposal rules; this type only
//! knows how to clear and draw rectangles.

use crate::domain::frame::DecodedFrame;

/// Frame placement on the canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Outcome of compositing one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Composited {
    Drawn,
    /// The frame's pixels could not be decoded; the canvas is unchanged.
    Corrupt(String),
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// A fully transparent canvas.
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    #[cfg(test)]
    pub(crate) fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn snapshot(&self) -> DecodedFrame {
        DecodedFrame::from_rgba(self.width, self.height, self.pixels.clone())
    }

    /// Clears `rect` to transparent black.
    pub(crate) fn clear_rect(&mut self, rect: Rect) {
        let stride = self.width as usize * 4;
        for (x0, x1, y) in self.clipped_rows(rect) {
            let row = y * stride;
            self.pixels[row + x0 * 4..row + x1 * 4].fill(0);
        }
    }

    /// Draws `rgba` (a `rect`-sized bitmap) at `rect`.
    ///
    /// With `blend` the source is alpha-composited over the canvas, otherwise
    /// it replaces the covered pixels. Parts outside the canvas are dropped.
    pub(crate) fn draw(&mut self, rect: Rect, rgba: &[u8], blend: bool) {
        let src_stride = rect.width as usize * 4;
        if rgba.len() < src_stride * rect.height as usize {
            return;
        }

        let stride = self.width as usize * 4;
        for (x0, x1, y) in self.clipped_rows(rect) {
            let src_row = (y - rect.y as usize) * src_stride;
            let src_x = x0 - rect.x as usize;
            let src = &rgba[src_row + src_x * 4..src_row + (x1 - rect.x as usize) * 4];
            let dst = &mut self.pixels[y * stride + x0 * 4..y * stride + x1 * 4];

            if blend {
                for (dst, src) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                    blend_pixel(dst, src);
                }
            } else {
                dst.copy_from_slice(src);
            }
        }
    }

    /// Yields `(x_start, x_end, y)` for each canvas row `rect` covers.
    fn clipped_rows(&self, rect: Rect) -> impl Iterator<Item = (usize, usize, usize)> {
        let x0 = rect.x.min(self.width) as usize;
        let x1 = rect.x.saturating_add(rect.width).min(self.width) as usize;
        let y0 = rect.y.min(self.height) as usize;
        let y1 = rect.y.saturating_add(rect.height).min(self.height) as usize;
        (y0..y1).filter(move |_| x0 < x1).map(move |y| (x0, x1, y))
    }
}

/// Straight-alpha "source over" for one pixel.
fn blend_pixel(dst: &mut [u8], src: &[u8]) {
    let src_a = u32::from(src[3]);
    match src_a {
        0 => {}
        255 => dst.copy_from_slice(src),
        _ => {
            let dst_a = u32::from(dst[3]) * (255 - src_a) / 255;
            let out_a = src_a + dst_a;
            for channel in 0..3 {
                let value = (u32::from(src[channel]) * src_a + u32::from(dst[channel]) * dst_a) / out_a;
                #[allow(clippy::cast_possible_truncation)]
                {
                    dst[channel] = value as u8;
                }
            }
            #[allow(clippy::cast_possible_truncation)]
            {
                dst[3] = out_a as u8;
            }
        }
    }
}
