// SPDX-License-Identifier: MPL-2.0
//! Frame domain types.
//!
//! This module contains the value objects shared by the codecs, the cache
//! and the playback clock:
//! - [`DecodedFrame`]: a decoded RGBA bitmap
//! - [`CanvasSize`]: pixel dimensions of a frame or animation
//! - [`MemoryBudgetMb`], [`WindowOverride`]: validated cache settings

pub mod newtypes;
pub mod types;

pub use newtypes::{memory_budget_bounds, MemoryBudgetMb, WindowOverride};
pub use types::{size_for_image, CanvasSize, CanvasSized, DecodedFrame, BYTES_PER_PIXEL};
