// SPDX-License-Identifier: MPL-2.0
//! Codec port definition.
//!
//! The frame cache treats container parsing and frame decoding as an external
//! service. Infrastructure adapters ([`GifCodec`](crate::infrastructure::GifCodec),
//! [`WebpCodec`](crate::infrastructure::WebpCodec)) implement [`AnimationCodec`];
//! tests inject their own.

use crate::domain::frame::{CanvasSize, DecodedFrame};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// CodecError
// =============================================================================

/// Errors reported by a codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The bytes are not a container this codec understands.
    Unrecognized,

    /// The container is recognised but its structure is broken.
    Malformed(String),

    /// A specific frame could not be decoded.
    Frame {
        /// Index of the failing frame.
        index: usize,
        /// Codec-provided reason.
        reason: String,
    },

    /// The requested frame does not exist.
    FrameOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of frames the codec produced.
        count: usize,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Unrecognized => write!(f, "Unrecognized container"),
            CodecError::Malformed(msg) => write!(f, "Malformed container: {msg}"),
            CodecError::Frame { index, reason } => {
                write!(f, "Frame {index} failed to decode: {reason}")
            }
            CodecError::FrameOutOfRange { index, count } => {
                write!(f, "Frame {index} out of range ({count} frames)")
            }
        }
    }
}

impl std::error::Error for CodecError {}

// =============================================================================
// ContainerInfo
// =============================================================================

/// Metadata a codec extracts from a container without decoding pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInfo {
    /// Logical canvas size declared by the container.
    pub canvas: CanvasSize,

    /// Raw per-frame display durations, one per frame, as stored in the file.
    pub delays: Vec<Duration>,

    /// Loop count (0 = repeat forever).
    pub loop_count: u32,
}

impl ContainerInfo {
    /// Number of frames declared by the container.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.delays.len()
    }
}

// =============================================================================
// FrameSequence Trait
// =============================================================================

/// Forward decoding state over one container.
///
/// Compositing formats build frame `n` on top of frame `n - 1`. A sequence
/// keeps the last composited canvas, so requests in increasing order cost one
/// frame each. A request behind the current position rewinds to frame 0.
///
/// A frame whose pixels fail to decode yields an error for that index only;
/// later frames are drawn over the last good canvas.
pub trait FrameSequence: Send {
    /// Decodes frame `index`.
    ///
    /// # Errors
    ///
    /// Same as [`AnimationCodec::decode_frame`].
    fn decode(&mut self, index: usize) -> Result<DecodedFrame, CodecError>;
}

// =============================================================================
// AnimationCodec Trait
// =============================================================================

/// Port for parsing and decoding a multi-frame image container.
///
/// # Contract
///
/// - [`read_info`](Self::read_info) is called once at load time.
/// - [`decode_frame`](Self::decode_frame) is stateless with respect to the
///   codec: it may be called from any thread, for any index, in any order.
///   Whatever state is needed to produce frame `index` is rebuilt from `data`.
/// - [`sequence`](Self::sequence) hands that state to the caller instead, for
///   formats where rebuilding it costs more than one frame.
/// - A corrupt frame fails on its own; it never fails `read_info` or another
///   index.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the refill worker owns a shared
/// reference and decodes off the caller's thread.
pub trait AnimationCodec: Send + Sync {
    /// Short name used in logs ("gif", "webp").
    fn name(&self) -> &'static str;

    /// Parses the container header and per-frame metadata without decoding
    /// pixels.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Unrecognized`] when `data` is not this codec's
    /// format and [`CodecError::Malformed`] when parsing fails.
    fn read_info(&self, data: &[u8]) -> Result<ContainerInfo, CodecError>;

    /// Decodes frame `index` into a full-canvas RGBA bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Frame`] or [`CodecError::FrameOutOfRange`] when
    /// the frame cannot be produced.
    fn decode_frame(&self, data: &[u8], index: usize) -> Result<DecodedFrame, CodecError>;

    /// Opens a forward decoding sequence over `data`.
    ///
    /// Returns `None` when frames decode independently and
    /// [`decode_frame`](Self::decode_frame) is already cheap.
    fn sequence(&self, data: Arc<[u8]>) -> Option<Box<dyn FrameSequence>> {
        let _ = data;
        None
    }
}
