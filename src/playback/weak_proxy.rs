// SPDX-License-Identifier: MPL-2.0
//! Non-owning reference for periodic drivers.
//!
//! A timer that held a strong reference to the thing it ticks would keep that
//! thing alive forever. [`WeakProxy`] holds only a [`Weak`] and turns every call
//! into a no-op once the target is gone.

use std::sync::{Arc, Weak};
use std::time::Duration;

/// Something driven by a periodic tick.
pub trait TickTarget: Send + Sync {
    /// Called once per tick with the time elapsed since the previous tick.
    fn tick(&self, elapsed: Duration);

    /// Returns true once the target wants no more ticks.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Forwards calls to a target while it is alive.
#[derive(Debug)]
pub struct WeakProxy<T: ?Sized> {
    target: Weak<T>,
}

impl<T: ?Sized> WeakProxy<T> {
    #[must_use]
    pub fn new(target: &Arc<T>) -> Self {
        Self {
            target: Arc::downgrade(target),
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Runs `f` against the target, or returns `None` if it was dropped.
    ///
    /// The target is kept alive for the duration of `f` only.
    pub fn forward<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.target.upgrade().map(|target| f(&target))
    }
}

impl<T: ?Sized> Clone for WeakProxy<T> {
    fn clone(&self) -> Self {
        Self {
            target: Weak::clone(&self.target),
        }
    }
}

impl<T: TickTarget + ?Sized> TickTarget for WeakProxy<T> {
    fn tick(&self, elapsed: Duration) {
        let _ = self.forward(|target| target.tick(elapsed));
    }

    /// A dropped target counts as finished.
    fn is_finished(&self) -> bool {
        self.forward(|target| target.is_finished()).unwrap_or(true)
    }
}
