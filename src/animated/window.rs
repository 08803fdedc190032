// SPDX-License-Identifier: MPL-2.0
//! Cache window sizing policy and window geometry.
//!
//! # Policy
//!
//! The number of frames worth keeping resident is derived from how many
//! decoded frames fit in the memory budget:
//!
//! - Large frames get a small window, bounding memory.
//! - Small frames get a window approaching the frame count, so each frame is
//!   decoded once and looping playback costs no further CPU.
//!
//! The policy is a pure function. Only its output is stored, so the size can
//! never drift away from its inputs.

use crate::domain::frame::WindowOverride;

/// Computes the target number of resident frames.
///
/// - `frame_bytes`: decoded size of one frame
/// - `frame_count`: frames in the animation
/// - `budget_bytes`: memory available for decoded frames
/// - `cap`: optional hard cap on top of the budget
///
/// The result is at least 1, at least 2 when there is more than one frame
/// (current + next, so playback never drains the cache while a refill is
/// pending), never more than `frame_count`, and never more than `cap`.
#[must_use]
pub fn optimal_window_size(
    frame_bytes: u64,
    frame_count: usize,
    budget_bytes: u64,
    cap: WindowOverride,
) -> usize {
    let frame_count = frame_count.max(1);

    let naive = if frame_bytes == 0 {
        frame_count
    } else {
        usize::try_from(budget_bytes / frame_bytes).unwrap_or(usize::MAX)
    };

    let floor = if frame_count > 1 { 2 } else { 1 };
    let mut size = naive.max(floor).min(frame_count);

    if let Some(limit) = cap.limit() {
        size = size.min(limit);
    }

    size.max(1)
}

/// A contiguous, wrap-around run of frame indices.
///
/// The window starts at the playback cursor and extends forward, so the frames
/// about to be shown are the ones kept resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: usize,
    len: usize,
    frame_count: usize,
}

impl Window {
    /// Creates a window of `len` frames starting at `start`.
    ///
    /// `start` wraps modulo `frame_count`; `len` is clamped to `1..=frame_count`.
    #[must_use]
    pub fn new(start: usize, len: usize, frame_count: usize) -> Self {
        let frame_count = frame_count.max(1);
        Self {
            start: start % frame_count,
            len: len.clamp(1, frame_count),
            frame_count,
        }
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the window covers every frame.
    #[must_use]
    pub fn is_full_cycle(&self) -> bool {
        self.len == self.frame_count
    }

    /// Returns true if `index` is inside the window.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index < self.frame_count
            && (index + self.frame_count - self.start) % self.frame_count < self.len
    }

    /// Iterates the window's indices, nearest to the cursor first.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).map(move |offset| (self.start + offset) % self.frame_count)
    }
}
