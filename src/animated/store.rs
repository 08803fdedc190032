// SPDX-License-Identifier: MPL-2.0
//! Frame cache store shared between the caller and the refill worker.
//!
//! # Design
//!
//! - **Index-addressed**: one slot per frame, so a lookup touches a single
//!   slot lock and never contends with writes to other frames
//! - **Single writer**: slots and the window size are written only by the
//!   refill worker (plus the poster seed at construction)
//! - **Atomic cursor**: `last_requested` is written by the caller and read by
//!   the worker
//! - **Teardown gate**: every worker mutation runs under a mutex that
//!   [`FrameStore::shutdown`] also takes, so once shutdown returns no
//!   mutation can be observed

use super::window::{optimal_window_size, Window};
use crate::application::port::CacheObserver;
use crate::config::FRAMES_AFTER_MEMORY_WARNING;
use crate::domain::frame::{DecodedFrame, WindowOverride};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

type Slot = RwLock<Option<Arc<DecodedFrame>>>;

/// Lifecycle of the background refill worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Every in-window frame is resident (or known to be undecodable).
    Idle,
    /// Decoding missing in-window frames.
    Filling,
    /// The owner was dropped; no further work happens.
    Stopped,
}

impl WorkerState {
    fn as_u8(self) -> u8 {
        match self {
            WorkerState::Idle => 0,
            WorkerState::Filling => 1,
            WorkerState::Stopped => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Filling,
            _ => WorkerState::Stopped,
        }
    }
}

/// Result of a worker commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct CommitOutcome {
    pub inserted: bool,
    pub evicted: usize,
}

impl CommitOutcome {
    fn changed(self) -> bool {
        self.inserted || self.evicted > 0
    }
}

/// Sizing inputs fixed at construction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StoreSettings {
    pub frame_bytes: u64,
    pub budget_bytes: u64,
    pub window_override: WindowOverride,
    pub memory_warning_reset: Duration,
}

pub(crate) struct FrameStore {
    slots: Vec<Slot>,
    frame_bytes: u64,
    last_requested: AtomicUsize,
    window_size: AtomicUsize,
    budget_bytes: AtomicU64,
    window_override: AtomicUsize,
    memory_warning_reset: Duration,
    pressure_until: Mutex<Option<Instant>>,
    state: AtomicU8,
    stopped: AtomicBool,
    teardown: Mutex<()>,
    observer: Option<Arc<dyn CacheObserver>>,
}

impl FrameStore {
    /// Creates a store for `frame_count` frames with the poster seeded at index 0.
    pub(crate) fn new(
        frame_count: usize,
        poster: Arc<DecodedFrame>,
        settings: StoreSettings,
        observer: Option<Arc<dyn CacheObserver>>,
    ) -> Self {
        let frame_count = frame_count.max(1);
        let slots: Vec<Slot> = (0..frame_count).map(|_| RwLock::new(None)).collect();
        *slots[0].write().unwrap_or_else(PoisonError::into_inner) = Some(poster);

        let initial_window = optimal_window_size(
            settings.frame_bytes,
            frame_count,
            settings.budget_bytes,
            settings.window_override,
        );

        Self {
            slots,
            frame_bytes: settings.frame_bytes,
            last_requested: AtomicUsize::new(0),
            window_size: AtomicUsize::new(initial_window),
            budget_bytes: AtomicU64::new(settings.budget_bytes),
            window_override: AtomicUsize::new(settings.window_override.value()),
            memory_warning_reset: settings.memory_warning_reset,
            pressure_until: Mutex::new(None),
            state: AtomicU8::new(WorkerState::Idle.as_u8()),
            stopped: AtomicBool::new(false),
            teardown: Mutex::new(()),
            observer,
        }
    }

    pub(crate) fn frame_count(&self) -> usize {
        self.slots.len()
    }

    // =========================================================================
    // Caller side
    // =========================================================================

    /// Returns the resident frame at `index` without recording a request.
    pub(crate) fn peek(&self, index: usize) -> Option<Arc<DecodedFrame>> {
        self.slots
            .get(index)?
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Looks up `index` and records it as the playback cursor.
    ///
    /// Returns the frame (if resident) and whether the worker should be woken.
    pub(crate) fn request(&self, index: usize) -> (Option<Arc<DecodedFrame>>, bool) {
        let frame = self.peek(index);
        let previous = self.last_requested.swap(index, Ordering::AcqRel);
        let hit = frame.is_some();

        if let Some(observer) = &self.observer {
            observer.frame_requested(index, hit);
        }

        (frame, previous != index || !hit)
    }

    pub(crate) fn last_requested(&self) -> usize {
        self.last_requested.load(Ordering::Acquire)
    }

    pub(crate) fn window_size(&self) -> usize {
        self.window_size.load(Ordering::Acquire)
    }

    pub(crate) fn budget_bytes(&self) -> u64 {
        self.budget_bytes.load(Ordering::Acquire)
    }

    pub(crate) fn window_override(&self) -> WindowOverride {
        WindowOverride::new(self.window_override.load(Ordering::Acquire))
    }

    pub(crate) fn set_budget_bytes(&self, bytes: u64) {
        self.budget_bytes.store(bytes, Ordering::Release);
    }

    pub(crate) fn set_window_override(&self, cap: WindowOverride) {
        self.window_override.store(cap.value(), Ordering::Release);
    }

    /// Starts (or extends) a memory-warning cap.
    pub(crate) fn raise_memory_warning(&self, now: Instant) {
        *self.lock_pressure() = Some(now + self.memory_warning_reset);
    }

    /// Indices currently resident, ascending.
    pub(crate) fn resident_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.read().unwrap_or_else(PoisonError::into_inner).is_some())
            .map(|(index, _)| index)
            .collect()
    }

    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Signals teardown. After this returns the worker performs no mutation.
    pub(crate) fn shutdown(&self) {
        let _gate = self.lock_teardown();
        self.stopped.store(true, Ordering::Release);
        self.state
            .store(WorkerState::Stopped.as_u8(), Ordering::Release);
    }

    // =========================================================================
    // Worker side
    // =========================================================================

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Records the worker state. `Stopped` is terminal and never overwritten.
    pub(crate) fn set_state(&self, state: WorkerState) {
        let stopped = WorkerState::Stopped.as_u8();
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != stopped).then_some(state.as_u8())
            });
    }

    /// Time left on an active memory-warning cap.
    pub(crate) fn pressure_remaining(&self, now: Instant) -> Option<Duration> {
        let until = (*self.lock_pressure())?;
        Some(until.saturating_duration_since(now))
    }

    /// Re-evaluates the sizing policy, records the size and returns the
    /// window anchored at the current cursor.
    pub(crate) fn snapshot_window(&self, now: Instant) -> Window {
        let under_pressure = {
            let mut pressure = self.lock_pressure();
            match *pressure {
                Some(until) if until <= now => {
                    tracing::debug!("memory warning cap lifted");
                    *pressure = None;
                    false
                }
                Some(_) => true,
                None => false,
            }
        };

        let mut cap = self.window_override();
        if under_pressure {
            let limit = cap
                .limit()
                .map_or(FRAMES_AFTER_MEMORY_WARNING, |l| l.min(FRAMES_AFTER_MEMORY_WARNING));
            cap = WindowOverride::new(limit);
        }

        let size = optimal_window_size(
            self.frame_bytes,
            self.frame_count(),
            self.budget_bytes(),
            cap,
        );

        let previous = self.window_size.swap(size, Ordering::AcqRel);
        if previous != size {
            tracing::debug!(from = previous, to = size, "cache window resized");
        }

        Window::new(self.last_requested(), size, self.frame_count())
    }

    /// Stores a decoded frame (if still inside `window`) and evicts every
    /// resident frame outside `window`.
    ///
    /// Returns `None` when the store was shut down; nothing is touched then.
    pub(crate) fn commit(
        &self,
        decoded: Option<(usize, Arc<DecodedFrame>)>,
        window: &Window,
    ) -> Option<CommitOutcome> {
        let _gate = self.lock_teardown();
        if self.is_stopped() {
            return None;
        }

        let mut outcome = CommitOutcome::default();

        // Bitmaps leaving the store are freed after their slot lock is
        // released.
        let mut released: Vec<Arc<DecodedFrame>> = Vec::new();

        if let Some((index, frame)) = decoded {
            if window.contains(index) && index < self.slots.len() {
                released.extend(self.replace_slot(index, Some(frame)));
                outcome.inserted = true;
            }
        }

        for index in 0..self.slots.len() {
            // The poster stays while the cursor sits on it; the window always
            // covers its own start, so the containment check handles both.
            if window.contains(index) {
                continue;
            }
            if let Some(evicted) = self.replace_slot(index, None) {
                released.push(evicted);
                outcome.evicted += 1;
            }
        }

        if outcome.changed() {
            if let Some(observer) = &self.observer {
                observer.frames_cached(&self.resident_indices());
            }
        }

        drop(released);
        Some(outcome)
    }

    /// Swaps the content of slot `index`, returning what was there. The slot
    /// lock is held only for the swap.
    fn replace_slot(
        &self,
        index: usize,
        frame: Option<Arc<DecodedFrame>>,
    ) -> Option<Arc<DecodedFrame>> {
        let slot = self.slots.get(index)?;
        let mut guard = slot.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, frame)
    }

    /// Returns true if `index` is resident.
    pub(crate) fn is_resident(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| slot.read().unwrap_or_else(PoisonError::into_inner).is_some())
    }

    fn lock_teardown(&self) -> MutexGuard<'_, ()> {
        self.teardown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pressure(&self) -> MutexGuard<'_, Option<Instant>> {
        self.pressure_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for FrameStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStore")
            .field("frame_count", &self.frame_count())
            .field("resident", &self.resident_indices().len())
            .field("window_size", &self.window_size())
            .field("last_requested", &self.last_requested())
            .field("budget_bytes", &self.budget_bytes())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
