// SPDX-License-Identifier: MPL-2.0
//! Test utilities shared by unit tests.
//!
//! Re-exports the `approx` crate's assertion macros for float comparison and
//! provides small fixtures: in-memory GIF and animated WebP encoders, helpers
//! that damage one frame of those files, and a scripted codec whose frames
//! can be made to fail or to decode slowly.

// Re-export approx macros for convenient use in tests
pub use approx::assert_abs_diff_eq;

use crate::application::port::{AnimationCodec, CodecError, ContainerInfo, FrameSequence};
use crate::domain::frame::{CanvasSize, DecodedFrame, BYTES_PER_PIXEL};
use crate::infrastructure::webp_demux;
use image_rs::codecs::gif::{GifEncoder, Repeat};
use image_rs::{Delay, Frame, Rgba, RgbaImage};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Encodes `frame_count` solid-colour frames into an in-memory GIF.
pub fn encode_gif(
    width: u32,
    height: u32,
    frame_count: usize,
    delay_ms: u32,
    repeat: Repeat,
) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder.set_repeat(repeat).expect("set repeat");
        let frames = (0..frame_count).map(|i| {
            #[allow(clippy::cast_possible_truncation)]
            let shade = (i * 20 % 256) as u8;
            let buffer = RgbaImage::from_pixel(width, height, Rgba([shade, 0, 255 - shade, 255]));
            Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1))
        });
        encoder.encode_frames(frames).expect("encode frames");
    }
    bytes
}

/// Overwrites the first LZW sub-block of GIF frame `frame` with `0xFF`.
///
/// The frame's header stays intact, so only its pixels fail to decode.
pub fn corrupt_gif_frame(data: &mut [u8], frame: usize) {
    fn color_table_len(flags: u8) -> usize {
        if flags & 0x80 == 0 {
            0
        } else {
            3 << ((flags & 0x07) + 1)
        }
    }

    fn skip_sub_blocks(data: &[u8], mut pos: usize) -> usize {
        while data[pos] != 0 {
            pos += usize::from(data[pos]) + 1;
        }
        pos + 1
    }

    let mut pos = 13 + color_table_len(data[10]);
    let mut seen = 0;
    loop {
        match data[pos] {
            // Extension: introducer, label, then sub-blocks.
            0x21 => pos = skip_sub_blocks(data, pos + 2),
            0x2C => {
                let flags = data[pos + 9];
                // Descriptor, local color table, LZW minimum code size.
                pos += 10 + color_table_len(flags) + 1;
                if seen == frame {
                    let len = usize::from(data[pos]);
                    data[pos + 1..=pos + len].fill(0xFF);
                    return;
                }
                seen += 1;
                pos = skip_sub_blocks(data, pos);
            }
            0x3B => panic!("gif has only {seen} frames"),
            other => panic!("unexpected gif block {other:#x} at {pos}"),
        }
    }
}

/// Animated WebP fixture: solid lossless frames covering the whole canvas.
#[derive(Debug, Clone)]
pub struct WebpFixture {
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
    pub delay_ms: u32,
    /// ANIM loop count (0 = forever).
    pub loop_count: u16,
}

impl WebpFixture {
    pub fn new(width: u32, height: u32, frame_count: usize) -> Self {
        Self {
            width,
            height,
            frame_count,
            delay_ms: 100,
            loop_count: 0,
        }
    }

    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Colour of every pixel in frame `index`.
    pub fn pixel(&self, index: usize) -> [u8; 4] {
        #[allow(clippy::cast_possible_truncation)]
        let shade = (index * 40 % 256) as u8;
        [shade, 64, 255 - shade, 255]
    }
}

fn push_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&u32::try_from(payload.len()).expect("chunk size").to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

fn push_u24(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}

/// Encodes `fixture` as an animated WebP: VP8X + ANIM + one ANMF per frame,
/// each frame a lossless bitstream drawn without blending.
pub fn encode_webp(fixture: &WebpFixture) -> Vec<u8> {
    let (width, height) = (fixture.width, fixture.height);

    let mut body = Vec::new();
    let mut vp8x = vec![0b0001_0010, 0, 0, 0];
    push_u24(&mut vp8x, width - 1);
    push_u24(&mut vp8x, height - 1);
    push_chunk(&mut body, b"VP8X", &vp8x);

    let mut anim = vec![0, 0, 0, 0];
    anim.extend_from_slice(&fixture.loop_count.to_le_bytes());
    push_chunk(&mut body, b"ANIM", &anim);

    for index in 0..fixture.frame_count {
        let pixels = fixture.pixel(index).repeat(width as usize * height as usize);
        let mut still = Vec::new();
        image_webp::WebPEncoder::new(&mut still)
            .encode(&pixels, width, height, image_webp::ColorType::Rgba8)
            .expect("encode frame");

        let mut anmf = Vec::new();
        push_u24(&mut anmf, 0);
        push_u24(&mut anmf, 0);
        push_u24(&mut anmf, width - 1);
        push_u24(&mut anmf, height - 1);
        push_u24(&mut anmf, fixture.delay_ms);
        anmf.push(0b0000_0010);
        // Skip the still image's RIFF header; keep its VP8L chunk.
        anmf.extend_from_slice(&still[12..]);
        push_chunk(&mut body, b"ANMF", &anmf);
    }

    let mut out = Vec::with_capacity(body.len() + 12);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&u32::try_from(body.len() + 4).expect("riff size").to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(&body);
    out
}

/// Breaks the VP8L signature of WebP frame `frame`.
pub fn corrupt_webp_frame(data: &mut [u8], frame: usize) {
    let layout = webp_demux::demux(data).expect("demux fixture");
    let bitstream = layout.frames[frame].bitstream.clone();
    // Sub-chunk header, then the 0x2f signature byte.
    data[bitstream.start + 8] = 0;
}

/// Waits until `condition` holds or `timeout` elapses.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Codec with scripted behaviour for cache tests.
///
/// The "container" is ignored; frame count, canvas and delays come from the
/// script. Frames listed in `broken` always fail to decode.
#[derive(Debug)]
pub struct ScriptedCodec {
    pub canvas: CanvasSize,
    pub delays: Vec<Duration>,
    pub loop_count: u32,
    pub broken: HashSet<usize>,
    pub decode_delay: Duration,
    pub decodes: AtomicUsize,
    /// Hand out a [`ScriptedSequence`] from `sequence`.
    pub sequenced: bool,
    pub sequence_decodes: Arc<AtomicUsize>,
}

impl ScriptedCodec {
    pub fn new(width: u32, height: u32, frame_count: usize) -> Self {
        Self {
            canvas: CanvasSize::new(width, height),
            delays: vec![Duration::from_millis(100); frame_count],
            loop_count: 0,
            broken: HashSet::new(),
            decode_delay: Duration::ZERO,
            decodes: AtomicUsize::new(0),
            sequenced: false,
            sequence_decodes: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn with_sequence(mut self) -> Self {
        self.sequenced = true;
        self
    }

    #[must_use]
    pub fn with_broken(mut self, index: usize) -> Self {
        self.broken.insert(index);
        self
    }

    #[must_use]
    pub fn with_decode_delay(mut self, delay: Duration) -> Self {
        self.decode_delay = delay;
        self
    }

    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }

    pub fn sequence_decode_count(&self) -> usize {
        self.sequence_decodes.load(Ordering::SeqCst)
    }
}

fn scripted_frame(
    canvas: CanvasSize,
    frame_count: usize,
    broken: &HashSet<usize>,
    index: usize,
) -> Result<DecodedFrame, CodecError> {
    if index >= frame_count {
        return Err(CodecError::FrameOutOfRange {
            index,
            count: frame_count,
        });
    }
    if broken.contains(&index) {
        return Err(CodecError::Frame {
            index,
            reason: "scripted failure".into(),
        });
    }
    #[allow(clippy::cast_possible_truncation)]
    let len = canvas.pixel_count() as usize * BYTES_PER_PIXEL as usize;
    #[allow(clippy::cast_possible_truncation)]
    let fill = index as u8;
    Ok(DecodedFrame::from_rgba(canvas.width, canvas.height, vec![fill; len]))
}

/// Sequence handed out by a [`ScriptedCodec`] built `with_sequence`.
#[derive(Debug)]
pub struct ScriptedSequence {
    canvas: CanvasSize,
    frame_count: usize,
    broken: HashSet<usize>,
    decodes: Arc<AtomicUsize>,
}

impl FrameSequence for ScriptedSequence {
    fn decode(&mut self, index: usize) -> Result<DecodedFrame, CodecError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        scripted_frame(self.canvas, self.frame_count, &self.broken, index)
    }
}

impl AnimationCodec for ScriptedCodec {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn read_info(&self, data: &[u8]) -> Result<ContainerInfo, CodecError> {
        if data.is_empty() {
            return Err(CodecError::Unrecognized);
        }
        Ok(ContainerInfo {
            canvas: self.canvas,
            delays: self.delays.clone(),
            loop_count: self.loop_count,
        })
    }

    fn decode_frame(&self, _data: &[u8], index: usize) -> Result<DecodedFrame, CodecError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        if !self.decode_delay.is_zero() {
            std::thread::sleep(self.decode_delay);
        }
        scripted_frame(self.canvas, self.delays.len(), &self.broken, index)
    }

    fn sequence(&self, _data: Arc<[u8]>) -> Option<Box<dyn FrameSequence>> {
        self.sequenced.then(|| {
            Box::new(ScriptedSequence {
                canvas: self.canvas,
                frame_count: self.delays.len(),
                broken: self.broken.clone(),
                decodes: Arc::clone(&self.sequence_decodes),
            }) as Box<dyn FrameSequence>
        })
    }
}
