// SPDX-License-Identifier: MPL-2.0
//! Chunk-level walk over an animated WebP container.
//!
//! Lists the ANMF frame records (placement, duration, blend and dispose
//! flags, bitstream location) without touching any pixel data. Each frame's
//! bitstream can then be rewrapped as a standalone still image and decoded
//! on its own, so a damaged frame never blocks its neighbours.

use super::canvas::Rect;
use crate::application::port::CodecError;
use std::ops::Range;
use std::time::Duration;

const RIFF_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const ANMF_HEADER_LEN: usize = 16;
const VP8X_PAYLOAD_LEN: u32 = 10;

const VP8X_ALPHA: u8 = 0b0001_0000;
const ANMF_NO_BLEND: u8 = 0b0000_0010;
const ANMF_DISPOSE: u8 = 0b0000_0001;

/// One ANMF record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnimationFrame {
    pub rect: Rect,
    pub duration: Duration,
    /// Alpha-blend over the canvas; otherwise replace the covered area.
    pub blend: bool,
    /// Clear the frame's area to transparent before the next frame draws.
    pub dispose: bool,
    /// Sub-chunks (ALPH, VP8, VP8L) carrying the frame's pixels.
    pub bitstream: Range<usize>,
    pub has_alpha: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<AnimationFrame>,
}

struct Chunk {
    fourcc: [u8; 4],
    payload: Range<usize>,
}

/// Iterates chunks in `data[range]`. Stops at the first chunk that does not
/// fit, which keeps a truncated file's complete frames usable.
struct Chunks<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Chunks<'a> {
    fn new(data: &'a [u8], range: Range<usize>) -> Self {
        Self {
            data,
            pos: range.start,
            end: range.end.min(data.len()),
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let header = self.data.get(self.pos..self.pos + CHUNK_HEADER_LEN)?;
        if self.pos + CHUNK_HEADER_LEN > self.end {
            return None;
        }
        let mut fourcc = [0; 4];
        fourcc.copy_from_slice(&header[..4]);
        let size = read_u32(&header[4..]) as usize;

        let start = self.pos + CHUNK_HEADER_LEN;
        let end = start.checked_add(size)?;
        if end > self.end {
            return None;
        }
        // Payloads are padded to an even length.
        self.pos = end + (size & 1);
        Some(Chunk {
            fourcc,
            payload: start..end,
        })
    }
}

fn read_u24(bytes: &[u8]) -> u32 {
    u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn push_u24(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}

/// Walks the container and lists its animation frames.
///
/// # Errors
///
/// [`CodecError::Malformed`] when the RIFF header or the VP8X chunk is
/// missing.
pub(crate) fn demux(data: &[u8]) -> Result<Layout, CodecError> {
    if data.len() < RIFF_HEADER_LEN || &data[..4] != b"RIFF" || &data[8..12] != b"WEBP" {
        return Err(CodecError::Malformed("missing RIFF/WEBP header".into()));
    }
    let riff_end = (read_u32(&data[4..8]) as usize).saturating_add(8);

    let mut chunks = Chunks::new(data, RIFF_HEADER_LEN..riff_end);
    let (width, height) = match chunks.next() {
        Some(chunk) if &chunk.fourcc == b"VP8X" && chunk.payload.len() >= 10 => {
            let payload = &data[chunk.payload];
            (read_u24(&payload[4..7]) + 1, read_u24(&payload[7..10]) + 1)
        }
        _ => return Err(CodecError::Malformed("missing VP8X chunk".into())),
    };

    let frames = chunks
        .filter(|chunk| &chunk.fourcc == b"ANMF" && chunk.payload.len() >= ANMF_HEADER_LEN)
        .map(|chunk| {
            let header = &data[chunk.payload.start..chunk.payload.start + ANMF_HEADER_LEN];
            let flags = header[15];
            let bitstream = chunk.payload.start + ANMF_HEADER_LEN..chunk.payload.end;
            let has_alpha = Chunks::new(data, bitstream.clone())
                .any(|sub| &sub.fourcc == b"ALPH" || &sub.fourcc == b"VP8L");

            AnimationFrame {
                rect: Rect {
                    x: read_u24(&header[0..3]) * 2,
                    y: read_u24(&header[3..6]) * 2,
                    width: read_u24(&header[6..9]) + 1,
                    height: read_u24(&header[9..12]) + 1,
                },
                duration: Duration::from_millis(u64::from(read_u24(&header[12..15]))),
                blend: flags & ANMF_NO_BLEND == 0,
                dispose: flags & ANMF_DISPOSE != 0,
                bitstream,
                has_alpha,
            }
        })
        .collect();

    Ok(Layout {
        width,
        height,
        frames,
    })
}

/// Wraps one frame's bitstream in an extended-format still image.
///
/// # Errors
///
/// [`CodecError::Malformed`] when the frame is larger than a RIFF file can
/// describe.
pub(crate) fn still_image(data: &[u8], frame: &AnimationFrame) -> Result<Vec<u8>, CodecError> {
    let body = data
        .get(frame.bitstream.clone())
        .ok_or_else(|| CodecError::Malformed("frame outside container".into()))?;
    let riff_size = u32::try_from(4 + CHUNK_HEADER_LEN + VP8X_PAYLOAD_LEN as usize + body.len())
        .map_err(|_| CodecError::Malformed("frame too large".into()))?;

    let mut out = Vec::with_capacity(riff_size as usize + 8);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(b"VP8X");
    out.extend_from_slice(&VP8X_PAYLOAD_LEN.to_le_bytes());
    out.push(if frame.has_alpha { VP8X_ALPHA } else { 0 });
    out.extend_from_slice(&[0; 3]);
    push_u24(&mut out, frame.rect.width - 1);
    push_u24(&mut out, frame.rect.height - 1);
    out.extend_from_slice(body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{encode_webp, WebpFixture};

    #[test]
    fn lists_every_frame_with_its_duration() {
        let data = encode_webp(&WebpFixture::new(6, 4, 3).with_delay_ms(70));
        let layout = demux(&data).expect("demux");

        assert_eq!((layout.width, layout.height), (6, 4));
        assert_eq!(layout.frames.len(), 3);
        for frame in &layout.frames {
            assert_eq!(frame.rect, Rect { x: 0, y: 0, width: 6, height: 4 });
            assert_eq!(frame.duration, Duration::from_millis(70));
            assert!(frame.has_alpha);
            assert!(!frame.blend);
            assert!(!frame.dispose);
        }
    }

    #[test]
    fn rejects_missing_header() {
        assert!(matches!(demux(b"RIFF"), Err(CodecError::Malformed(_))));
        assert!(matches!(
            demux(b"RIFF\x04\x00\x00\x00WEBP"),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn truncated_tail_keeps_complete_frames() {
        let data = encode_webp(&WebpFixture::new(4, 4, 4));
        let full = demux(&data).expect("demux");
        let last = full.frames.last().expect("frames").bitstream.clone();

        let layout = demux(&data[..last.start + 2]).expect("demux");
        assert_eq!(layout.frames.len(), 3);
    }

    #[test]
    fn still_image_decodes_with_image_webp() {
        let data = encode_webp(&WebpFixture::new(5, 3, 2));
        let layout = demux(&data).expect("demux");

        let still = still_image(&data, &layout.frames[1]).expect("still");
        let decoder = image_webp::WebPDecoder::new(std::io::Cursor::new(still)).expect("decoder");
        assert_eq!(decoder.dimensions(), (5, 3));
        assert!(!decoder.is_animated());
    }
}
