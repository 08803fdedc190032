// SPDX-License-Identifier: MPL-2.0
//! WebP codec (animated and still).
//!
//! Still images go through `image`'s WebP decoder and are exposed as
//! single-frame animations, so a caller can hand any WebP to the cache.
//!
//! Animations are read at the chunk level: `image-webp` supplies the canvas
//! and the ANIM loop count, [`webp_demux`](super::webp_demux) lists the frame
//! records, and [`WebpFrames`] decodes each frame's bitstream on its own
//! before compositing it. A frame that fails to decode leaves the canvas as
//! it was, and later frames draw on top of it.

use super::canvas::{Canvas, Composited, Rect};
use super::webp_demux::{self, AnimationFrame, Layout};
use crate::application::port::{AnimationCodec, CodecError, ContainerInfo, FrameSequence};
use crate::domain::frame::{CanvasSize, DecodedFrame};
use image_rs::codecs::webp::WebPDecoder;
use image_rs::{DynamicImage, ImageFormat};
use image_webp::LoopCount;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// Codec for WebP containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpCodec;

impl WebpCodec {
    /// Returns true if `data` looks like a RIFF/WEBP container.
    #[must_use]
    pub fn sniff(data: &[u8]) -> bool {
        matches!(image_rs::guess_format(data), Ok(ImageFormat::WebP))
    }

    fn open(data: &[u8]) -> Result<image_webp::WebPDecoder<Cursor<&[u8]>>, CodecError> {
        image_webp::WebPDecoder::new(Cursor::new(data)).map_err(|e| CodecError::Malformed(e.to_string()))
    }

    fn decode_still(data: &[u8], index: usize) -> Result<DecodedFrame, CodecError> {
        if index != 0 {
            return Err(CodecError::FrameOutOfRange { index, count: 1 });
        }
        let frame_error = |reason: String| CodecError::Frame { index, reason };
        let decoder = WebPDecoder::new(Cursor::new(data)).map_err(|e| frame_error(e.to_string()))?;
        let rgba = DynamicImage::from_decoder(decoder)
            .map_err(|e| frame_error(e.to_string()))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(DecodedFrame::from_rgba(width, height, rgba.into_raw()))
    }
}

/// Maps the ANIM loop count; 0 means forever on both sides.
fn loop_count_from_anim(count: LoopCount) -> u32 {
    match count {
        LoopCount::Forever => 0,
        LoopCount::Times(n) => u32::from(n.get()),
    }
}

impl AnimationCodec for WebpCodec {
    fn name(&self) -> &'static str {
        "webp"
    }

    fn read_info(&self, data: &[u8]) -> Result<ContainerInfo, CodecError> {
        if !Self::sniff(data) {
            return Err(CodecError::Unrecognized);
        }

        let decoder = Self::open(data)?;
        let (width, height) = decoder.dimensions();
        let canvas = CanvasSize::new(width, height);

        if !decoder.is_animated() {
            return Ok(ContainerInfo {
                canvas,
                delays: vec![Duration::ZERO],
                loop_count: 0,
            });
        }

        let layout = webp_demux::demux(data)?;
        Ok(ContainerInfo {
            canvas,
            delays: layout.frames.iter().map(|frame| frame.duration).collect(),
            loop_count: loop_count_from_anim(decoder.loop_count()),
        })
    }

    fn decode_frame(&self, data: &[u8], index: usize) -> Result<DecodedFrame, CodecError> {
        if Self::open(data)?.is_animated() {
            WebpFrames::new(data).decode(index)
        } else {
            Self::decode_still(data, index)
        }
    }

    fn sequence(&self, data: Arc<[u8]>) -> Option<Box<dyn FrameSequence>> {
        let animated = Self::open(&data).is_ok_and(|decoder| decoder.is_animated());
        animated.then(|| Box::new(WebpFrames::new(data)) as Box<dyn FrameSequence>)
    }
}

// =============================================================================
// WebpFrames
// =============================================================================

/// Forward compositor over an animated WebP.
pub struct WebpFrames<D: AsRef<[u8]>> {
    data: D,
    layout: Option<Layout>,
    canvas: Canvas,
    next: usize,
    /// Area the previous frame asked to clear before the next one draws.
    pending_clear: Option<Rect>,
}

impl<D: AsRef<[u8]>> WebpFrames<D> {
    pub fn new(data: D) -> Self {
        Self {
            data,
            layout: None,
            canvas: Canvas::new(0, 0),
            next: 0,
            pending_clear: None,
        }
    }

    /// Decodes frame `index`, reusing the current canvas when possible.
    ///
    /// # Errors
    ///
    /// [`CodecError::Frame`] when this frame's bitstream is corrupt,
    /// [`CodecError::Malformed`] when the container cannot be walked and
    /// [`CodecError::FrameOutOfRange`] past the last frame.
    pub fn decode(&mut self, index: usize) -> Result<DecodedFrame, CodecError> {
        if self.layout.is_none() || index < self.next {
            self.rewind()?;
        }

        loop {
            let current = self.next;
            match self.step() {
                Composited::End => {
                    return Err(CodecError::FrameOutOfRange {
                        index,
                        count: self.next,
                    })
                }
                Composited::Drawn if current == index => return Ok(self.canvas.snapshot()),
                Composited::Corrupt(reason) if current == index => {
                    return Err(CodecError::Frame { index, reason });
                }
                Composited::Drawn | Composited::Corrupt(_) => {}
            }
        }
    }

    fn rewind(&mut self) -> Result<(), CodecError> {
        let layout = match self.layout.take() {
            Some(layout) => layout,
            None => webp_demux::demux(self.data.as_ref())?,
        };
        self.canvas = Canvas::new(layout.width, layout.height);
        self.layout = Some(layout);
        self.next = 0;
        self.pending_clear = None;
        Ok(())
    }

    fn step(&mut self) -> Composited {
        let Some(frame) = self
            .layout
            .as_ref()
            .and_then(|layout| layout.frames.get(self.next))
            .cloned()
        else {
            return Composited::End;
        };
        self.next += 1;

        if let Some(rect) = self.pending_clear.take() {
            self.canvas.clear_rect(rect);
        }
        if frame.dispose {
            self.pending_clear = Some(frame.rect);
        }

        match decode_frame_pixels(self.data.as_ref(), &frame) {
            Ok(rgba) => {
                self.canvas.draw(frame.rect, &rgba, frame.blend);
                Composited::Drawn
            }
            Err(reason) => Composited::Corrupt(reason),
        }
    }
}

impl<D: AsRef<[u8]> + Send> FrameSequence for WebpFrames<D> {
    fn decode(&mut self, index: usize) -> Result<DecodedFrame, CodecError> {
        WebpFrames::decode(self, index)
    }
}

/// Decodes one frame's bitstream into a `rect`-sized RGBA bitmap.
fn decode_frame_pixels(data: &[u8], frame: &AnimationFrame) -> Result<Vec<u8>, String> {
    let still = webp_demux::still_image(data, frame).map_err(|e| e.to_string())?;
    let mut decoder = image_webp::WebPDecoder::new(Cursor::new(still)).map_err(|e| e.to_string())?;

    if decoder.dimensions() != (frame.rect.width, frame.rect.height) {
        return Err("frame size does not match its ANMF header".into());
    }
    let len = decoder
        .output_buffer_size()
        .ok_or_else(|| "frame too large".to_string())?;
    let mut pixels = vec![0; len];
    decoder.read_image(&mut pixels).map_err(|e| e.to_string())?;

    if decoder.has_alpha() {
        return Ok(pixels);
    }
    Ok(pixels
        .chunks_exact(3)
        .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
        .collect())
}
