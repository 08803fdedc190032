// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! Concrete implementations of the port traits defined in
//! `application::port`. These adapters wrap the `gif`, `image` and
//! `image-webp` crates.
//!
//! # Available Adapters
//!
//! - [`GifCodec`]: GIF87a/GIF89a animations
//! - [`WebpCodec`]: animated and still WebP
//!
//! [`detect_codec`] picks the adapter from the container signature.

pub(crate) mod canvas;
pub mod gif_decoder;
pub mod webp_decoder;
pub(crate) mod webp_demux;

pub use gif_decoder::{GifCodec, GifFrames};
pub use webp_decoder::{WebpCodec, WebpFrames};

use crate::application::port::AnimationCodec;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Returns the codec matching the container signature of `data`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] when no codec recognises the bytes.
pub fn detect_codec(data: &[u8]) -> Result<Arc<dyn AnimationCodec>> {
    if GifCodec::sniff(data) {
        Ok(Arc::new(GifCodec))
    } else if WebpCodec::sniff(data) {
        Ok(Arc::new(WebpCodec))
    } else {
        Err(Error::UnsupportedFormat)
    }
}
