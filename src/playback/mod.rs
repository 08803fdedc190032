// SPDX-License-Identifier: MPL-2.0
//! Playback driving: frame timing, the player and its periodic ticker.
//!
//! ```text
//! spawn_ticker ──tick──▶ WeakProxy<Player> ──▶ Player ──image_at──▶ AnimatedImage
//! ```
//!
//! The ticker reaches the player only through a [`WeakProxy`], so dropping the
//! player stops playback without any explicit cancellation.

mod clock;
mod ticker;
mod weak_proxy;

pub use clock::{PlaybackClock, Player};
pub use ticker::spawn_ticker;
pub use weak_proxy::{TickTarget, WeakProxy};
