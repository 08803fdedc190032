// SPDX-License-Identifier: MPL-2.0
//! `animated_frames` delivers decoded GIF and animated WebP frames to a
//! playback loop without blocking it and without exceeding a memory budget.
//!
//! The core is [`animated::AnimatedImage`]: it keeps a window of decoded frames
//! resident ahead of the playback position, sized from the frame dimensions
//! and the available memory, and refills it on a background thread.
//!
//! # Layers
//!
//! - [`domain`]: pure value types (frames, canvas sizes, clamped settings)
//! - [`application`]: codec and observer ports
//! - [`infrastructure`]: GIF and WebP codecs
//! - [`animated`]: the adaptive frame cache
//! - [`playback`]: timing clock, player and weak-referenced ticker
//! - [`diagnostics`]: memory monitor and cache statistics
//! - [`config`]: persisted settings

#![doc(html_root_url = "https://docs.rs/animated_frames/0.1.0")]

pub mod animated;
pub mod application;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod playback;

#[cfg(test)]
pub(crate) mod test_utils;

pub use animated::{AnimatedImage, CacheOptions};
pub use domain::frame::{size_for_image, CanvasSize, DecodedFrame};
pub use error::{Error, Result};
