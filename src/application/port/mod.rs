// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines abstract interfaces that infrastructure adapters implement.
//! These traits use only domain types, so the cache never sees `gif` or
//! `image` types directly.
//!
//! # Available Ports
//!
//! - [`codec`]: Container parsing and per-frame decoding
//! - [`observer`]: Optional debug hooks fired by the frame cache
//!
//! # Design Notes
//!
//! - Traits are `Send + Sync`: codecs run on the refill worker thread while
//!   observers are called from both the caller and the worker
//! - Methods return `Result` with domain error types
//!
//! # Example
//!
//! ```ignore
//! use animated_frames::application::port::AnimationCodec;
//!
//! fn poster(codec: &impl AnimationCodec, data: &[u8]) -> Option<DecodedFrame> {
//!     codec.read_info(data).ok()?;
//!     codec.decode_frame(data, 0).ok()
//! }
//! ```

pub mod codec;
pub mod observer;

pub use codec::{AnimationCodec, CodecError, ContainerInfo, FrameSequence};
pub use observer::CacheObserver;
