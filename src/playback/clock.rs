// SPDX-License-Identifier: MPL-2.0
//! Frame-timing clock and the player built on it.

use super::weak_proxy::TickTarget;
use crate::animated::AnimatedImage;
use crate::domain::frame::DecodedFrame;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Tracks which frame should be on screen.
///
/// Elapsed time accumulates only while the current frame is shown. When the
/// accumulator passes the frame's delay the clock moves on, possibly skipping
/// frames after a long tick. A miss stalls the clock: the time is dropped
/// and the same index is polled again on the next tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackClock {
    delays: Vec<Duration>,
    loop_count: u32,
    index: usize,
    accumulator: Duration,
    loops_completed: u32,
    finished: bool,
}

impl PlaybackClock {
    /// Creates a clock over `delays`; `loop_count` 0 plays forever.
    #[must_use]
    pub fn new(delays: Vec<Duration>, loop_count: u32) -> Self {
        Self {
            delays,
            loop_count,
            index: 0,
            accumulator: Duration::ZERO,
            loops_completed: 0,
            finished: false,
        }
    }

    #[must_use]
    pub fn for_image(image: &AnimatedImage) -> Self {
        Self::new(image.delay_times().to_vec(), image.loop_count())
    }

    /// Index of the frame that should be displayed now.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn loops_completed(&self) -> u32 {
        self.loops_completed
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advances by `elapsed` after the current frame was displayed.
    ///
    /// Returns the number of frame boundaries crossed.
    pub fn advance(&mut self, elapsed: Duration) -> usize {
        if self.finished || self.delays.is_empty() {
            return 0;
        }

        self.accumulator += elapsed;
        let mut crossed = 0;

        while let Some(delay) = self.delays.get(self.index).copied() {
            // A zero delay would spin forever.
            if delay.is_zero() || self.accumulator < delay {
                break;
            }
            self.accumulator -= delay;
            crossed += 1;

            if self.index + 1 < self.delays.len() {
                self.index += 1;
                continue;
            }

            self.loops_completed = self.loops_completed.saturating_add(1);
            if self.loop_count != 0 && self.loops_completed >= self.loop_count {
                self.finished = true;
                self.accumulator = Duration::ZERO;
                break;
            }
            self.index = 0;
        }

        crossed
    }

    /// Rewinds to the first frame.
    pub fn reset(&mut self) {
        self.index = 0;
        self.accumulator = Duration::ZERO;
        self.loops_completed = 0;
        self.finished = false;
    }
}

#[derive(Debug)]
struct PlayerState {
    clock: PlaybackClock,
    current_frame: Option<Arc<DecodedFrame>>,
    frames_shown: u64,
    stalls: u64,
}

/// Plays an [`AnimatedImage`] by polling its cache on every tick.
///
/// Tick it directly, or through a [`WeakProxy`](super::WeakProxy) from
/// [`spawn_ticker`](super::spawn_ticker) so the timer never keeps the player
/// alive.
#[derive(Debug)]
pub struct Player {
    image: Arc<AnimatedImage>,
    state: Mutex<PlayerState>,
}

impl Player {
    #[must_use]
    pub fn new(image: Arc<AnimatedImage>) -> Self {
        let clock = PlaybackClock::for_image(&image);
        let poster = Arc::clone(image.poster_frame());
        Self {
            image,
            state: Mutex::new(PlayerState {
                clock,
                current_frame: Some(poster),
                frames_shown: 0,
                stalls: 0,
            }),
        }
    }

    #[must_use]
    pub fn image(&self) -> &Arc<AnimatedImage> {
        &self.image
    }

    /// The frame last displayed (the poster before the first tick).
    #[must_use]
    pub fn current_frame(&self) -> Option<Arc<DecodedFrame>> {
        self.lock_state().current_frame.clone()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.lock_state().clock.current_index()
    }

    #[must_use]
    pub fn loops_completed(&self) -> u32 {
        self.lock_state().clock.loops_completed()
    }

    /// Ticks that displayed a frame.
    #[must_use]
    pub fn frames_shown(&self) -> u64 {
        self.lock_state().frames_shown
    }

    /// Ticks that found the wanted frame missing from the cache.
    #[must_use]
    pub fn stalls(&self) -> u64 {
        self.lock_state().stalls
    }

    pub fn rewind(&self) {
        self.lock_state().clock.reset();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TickTarget for Player {
    fn tick(&self, elapsed: Duration) {
        let mut state = self.lock_state();
        if state.clock.is_finished() {
            return;
        }

        let index = state.clock.current_index();
        match self.image.image_at(index) {
            Some(frame) => {
                state.current_frame = Some(frame);
                state.frames_shown += 1;
                state.clock.advance(elapsed);
                if state.clock.is_finished() {
                    tracing::debug!(loops = state.clock.loops_completed(), "playback finished");
                }
            }
            None => {
                state.stalls += 1;
                tracing::trace!(index, "waiting for frame");
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.lock_state().clock.is_finished()
    }
}
