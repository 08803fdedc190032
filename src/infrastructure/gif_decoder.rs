// SPDX-License-Identifier: MPL-2.0
//! Animated GIF codec.
//!
//! Built on the `gif` crate in two layers. The stream is read with frame
//! decoding skipped, which yields each frame's header and its raw LZW bytes;
//! the LZW data is then expanded frame by frame with a separate
//! [`FrameDecoder`]. A broken LZW stream therefore costs exactly one frame:
//! [`GifFrames`] keeps compositing later frames over the last good canvas.
//!
//! GIF frames are deltas on top of their predecessors. [`GifFrames`] keeps
//! the composited canvas between calls, so the refill worker pays one frame
//! per step while it moves forward and only replays from frame 0 after a
//! backward jump.

use super::canvas::{Canvas, Composited, Rect};
use crate::application::port::{AnimationCodec, CodecError, ContainerInfo, FrameSequence};
use crate::domain::frame::{CanvasSize, DecodedFrame};
use gif::streaming_decoder::FrameDecoder;
use gif::{ColorOutput, DecodeOptions, DisposalMethod};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// GIF signature prefix shared by GIF87a and GIF89a.
const GIF_MAGIC: &[u8] = b"GIF8";

/// GIF delays are stored in hundredths of a second.
const CENTISECOND_MS: u64 = 10;

/// Codec for GIF87a/GIF89a animations.
#[derive(Debug, Clone, Copy, Default)]
pub struct GifCodec;

impl GifCodec {
    /// Returns true if `data` starts with a GIF signature.
    #[must_use]
    pub fn sniff(data: &[u8]) -> bool {
        data.starts_with(GIF_MAGIC)
    }
}

/// Maps the NETSCAPE2.0 repeat setting onto a loop count.
///
/// `Infinite` becomes 0. A file without the extension decodes as
/// `Finite(0)` and plays once.
fn loop_count_from_repeat(repeat: gif::Repeat) -> u32 {
    match repeat {
        gif::Repeat::Infinite => 0,
        gif::Repeat::Finite(0) => 1,
        gif::Repeat::Finite(n) => u32::from(n),
    }
}

/// Options for walking the stream without expanding LZW data.
fn stream_options() -> DecodeOptions {
    let mut options = DecodeOptions::new();
    options.skip_frame_decoding(true);
    options.set_color_output(ColorOutput::RGBA);
    options
}

fn malformed(err: &gif::DecodingError) -> CodecError {
    CodecError::Malformed(err.to_string())
}

impl AnimationCodec for GifCodec {
    fn name(&self) -> &'static str {
        "gif"
    }

    fn read_info(&self, data: &[u8]) -> Result<ContainerInfo, CodecError> {
        if !Self::sniff(data) {
            return Err(CodecError::Unrecognized);
        }

        let mut decoder = stream_options()
            .read_info(data)
            .map_err(|e| malformed(&e))?;

        let canvas = CanvasSize::new(u32::from(decoder.width()), u32::from(decoder.height()));

        let mut delays = Vec::new();
        loop {
            match decoder.read_next_frame() {
                Ok(Some(frame)) => {
                    delays.push(Duration::from_millis(u64::from(frame.delay) * CENTISECOND_MS));
                }
                Ok(None) => break,
                // A damaged tail still leaves the frames before it playable.
                Err(err) if !delays.is_empty() => {
                    tracing::warn!(frames = delays.len(), error = %err, "gif stream truncated");
                    break;
                }
                Err(err) => return Err(malformed(&err)),
            }
        }

        Ok(ContainerInfo {
            canvas,
            delays,
            loop_count: loop_count_from_repeat(decoder.repeat()),
        })
    }

    fn decode_frame(&self, data: &[u8], index: usize) -> Result<DecodedFrame, CodecError> {
        GifFrames::new(data).decode(index)
    }

    fn sequence(&self, data: Arc<[u8]>) -> Option<Box<dyn FrameSequence>> {
        Some(Box::new(GifFrames::new(data)))
    }
}

// =============================================================================
// GifFrames
// =============================================================================

/// Open stream plus the compositing state it has produced so far.
struct Stream<D: AsRef<[u8]>> {
    reader: gif::Decoder<Cursor<D>>,
    lzw: FrameDecoder,
    canvas: Canvas,
    /// Canvas saved for a frame disposed with `Previous`.
    saved: Option<Canvas>,
    /// Disposal owed by the last frame, applied before the next one draws.
    pending: Option<(DisposalMethod, Rect)>,
}

/// Forward GIF compositor; see the module docs.
pub struct GifFrames<D: AsRef<[u8]>> {
    data: D,
    stream: Option<Stream<D>>,
    /// Index of the frame the next step produces.
    next: usize,
    /// Set once the stream ended or broke; only a rewind reopens it.
    exhausted: bool,
}

impl<D: AsRef<[u8]> + Clone> GifFrames<D> {
    pub fn new(data: D) -> Self {
        Self {
            data,
            stream: None,
            next: 0,
            exhausted: false,
        }
    }

    /// Decodes frame `index`, reusing the current canvas when possible.
    ///
    /// # Errors
    ///
    /// [`CodecError::Frame`] when this frame's pixels are corrupt,
    /// [`CodecError::Malformed`] when the stream breaks before reaching it and
    /// [`CodecError::FrameOutOfRange`] past the last frame.
    pub fn decode(&mut self, index: usize) -> Result<DecodedFrame, CodecError> {
        if index < self.next || (self.stream.is_none() && !self.exhausted) {
            self.rewind()?;
        }

        loop {
            let current = self.next;
            match self.step()? {
                Composited::End => {
                    return Err(CodecError::FrameOutOfRange {
                        index,
                        count: self.next,
                    })
                }
                Composited::Drawn if current == index => {
                    return self.stream.as_ref().map(|s| s.canvas.snapshot()).ok_or(
                        CodecError::FrameOutOfRange {
                            index,
                            count: self.next,
                        },
                    );
                }
                Composited::Corrupt(reason) if current == index => {
                    return Err(CodecError::Frame { index, reason });
                }
                Composited::Drawn | Composited::Corrupt(_) => {}
            }
        }
    }

    #[cfg(test)]
    fn position(&self) -> usize {
        self.next
    }

    fn rewind(&mut self) -> Result<(), CodecError> {
        if self.next > 0 {
            tracing::trace!(from = self.next, "rewinding gif stream");
        }
        self.stream = None;
        self.next = 0;
        self.exhausted = false;

        let reader = stream_options()
            .read_info(Cursor::new(self.data.clone()))
            .map_err(|e| malformed(&e))?;

        let mut lzw = FrameDecoder::new(stream_options());
        if let Some(palette) = reader.global_palette() {
            lzw.set_global_palette(palette.to_vec());
        }
        let canvas = Canvas::new(u32::from(reader.width()), u32::from(reader.height()));

        self.stream = Some(Stream {
            reader,
            lzw,
            canvas,
            saved: None,
            pending: None,
        });
        Ok(())
    }

    /// Composites the next frame onto the canvas.
    ///
    /// # Errors
    ///
    /// Fails when the stream itself is broken; nothing after that point is
    /// reachable until a rewind.
    fn step(&mut self) -> Result<Composited, CodecError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(Composited::End);
        };

        let mut frame = match stream.reader.read_next_frame() {
            Ok(Some(frame)) => frame.clone(),
            Ok(None) => {
                self.stream = None;
                self.exhausted = true;
                return Ok(Composited::End);
            }
            Err(err) => {
                self.stream = None;
                self.exhausted = true;
                return Err(malformed(&err));
            }
        };

        match stream.pending.take() {
            Some((DisposalMethod::Background, rect)) => stream.canvas.clear_rect(rect),
            Some((DisposalMethod::Previous, _)) => {
                if let Some(saved) = stream.saved.take() {
                    stream.canvas = saved;
                }
            }
            _ => {}
        }

        let rect = Rect {
            x: u32::from(frame.left),
            y: u32::from(frame.top),
            width: u32::from(frame.width),
            height: u32::from(frame.height),
        };
        if frame.dispose == DisposalMethod::Previous {
            stream.saved = Some(stream.canvas.clone());
        }
        stream.pending = Some((frame.dispose, rect));
        self.next += 1;

        Ok(match stream.lzw.decode_lzw_encoded_frame(&mut frame) {
            Ok(()) => {
                // GIF transparency is all-or-nothing, so blending just skips
                // the transparent index.
                stream.canvas.draw(rect, &frame.buffer, true);
                Composited::Drawn
            }
            Err(err) => Composited::Corrupt(err.to_string()),
        })
    }
}

impl<D: AsRef<[u8]> + Clone + Send> FrameSequence for GifFrames<D> {
    fn decode(&mut self, index: usize) -> Result<DecodedFrame, CodecError> {
        GifFrames::decode(self, index)
    }
}
