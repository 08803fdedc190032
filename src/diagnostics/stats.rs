// SPDX-License-Identifier: MPL-2.0
//! Cache statistics gathered through the observer hooks.

use crate::application::port::CacheObserver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// `image_at` calls that returned a frame.
    pub hits: u64,
    /// `image_at` calls that returned `None`.
    pub misses: u64,
    /// Refill steps that changed the resident set.
    pub refills: u64,
    /// Resident indices after the latest refill step.
    pub resident: Vec<usize>,
}

impl CacheStatsSnapshot {
    /// Returns the cache hit rate as a percentage (0.0 - 100.0).
    // Allow cast_precision_loss: counts stay far below the f64 mantissa.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Observer that counts cache traffic.
///
/// Attach with [`CacheOptions::with_observer`](crate::animated::CacheOptions::with_observer).
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    refills: AtomicU64,
    resident: Mutex<Vec<usize>>,
}

impl CacheStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            refills: self.refills.load(Ordering::Relaxed),
            resident: self
                .resident
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.refills.store(0, Ordering::Relaxed);
    }
}

impl CacheObserver for CacheStats {
    fn frames_cached(&self, resident: &[usize]) {
        self.refills.fetch_add(1, Ordering::Relaxed);
        let mut current = self.resident.lock().unwrap_or_else(PoisonError::into_inner);
        current.clear();
        current.extend_from_slice(resident);
    }

    fn frame_requested(&self, _index: usize, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}
