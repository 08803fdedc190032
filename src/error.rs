// SPDX-License-Identifier: MPL-2.0
//! Crate-wide error type.
//!
//! Only construction-time problems surface as errors. Per-frame decode
//! failures during background refill are logged and absorbed, and a cache
//! miss is a plain `None` from [`AnimatedImage::image_at`](crate::animated::AnimatedImage::image_at).

use crate::application::port::CodecError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Reading the source failed (file not found, permission denied, ...).
    #[error("I/O Error: {0}")]
    Io(String),

    /// The bytes are not a container any registered codec understands.
    #[error("Unsupported animation format")]
    UnsupportedFormat,

    /// The codec recognised the container but could not parse it.
    #[error("Decode Error: {0}")]
    Decode(#[from] CodecError),

    /// The container parsed but holds no frames.
    #[error("Animation contains no frames")]
    NoFrames,

    /// Frame 0 could not be decoded, so there is no poster frame.
    #[error("Poster frame could not be decoded: {0}")]
    PosterDecode(CodecError),

    #[error("Config Error: {0}")]
    Config(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
