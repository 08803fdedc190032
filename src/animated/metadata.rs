// SPDX-License-Identifier: MPL-2.0
//! Frame metadata table.
//!
//! Built once from the codec's [`ContainerInfo`] and never mutated afterwards.

use crate::application::port::ContainerInfo;
use crate::config::{DEFAULT_FRAME_DELAY_MS, MIN_FRAME_DELAY_MS};
use crate::error::{Error, Result};
use std::time::Duration;

/// Replaces unspecified or implausibly short delays.
///
/// Many GIFs store 0 or 1 centisecond delays and rely on viewers to slow them
/// down; browsers show such frames for 100 ms, and so do we.
#[must_use]
pub fn normalize_delay(delay: Duration) -> Duration {
    if delay < Duration::from_millis(MIN_FRAME_DELAY_MS) {
        Duration::from_millis(DEFAULT_FRAME_DELAY_MS)
    } else {
        delay
    }
}

/// Per-animation timing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMetadata {
    delay_times: Vec<Duration>,
    loop_count: u32,
}

impl FrameMetadata {
    /// Builds the table from container metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFrames`] if the container declares no frames.
    pub fn from_container(info: &ContainerInfo) -> Result<Self> {
        if info.delays.is_empty() {
            return Err(Error::NoFrames);
        }
        Ok(Self {
            delay_times: info.delays.iter().copied().map(normalize_delay).collect(),
            loop_count: info.loop_count,
        })
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.delay_times.len()
    }

    #[must_use]
    pub fn delay_times(&self) -> &[Duration] {
        &self.delay_times
    }

    /// Display duration of frame `index`, or `None` when out of range.
    #[must_use]
    pub fn delay_at(&self, index: usize) -> Option<Duration> {
        self.delay_times.get(index).copied()
    }

    #[must_use]
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Duration of one pass through every frame.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.delay_times.iter().sum()
    }
}
