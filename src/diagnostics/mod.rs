// SPDX-License-Identifier: MPL-2.0
//! Runtime diagnostics for frame caches.
//!
//! # Architecture
//!
//! - [`MemoryMonitor`]: samples available system memory on a background thread
//!   and publishes [`MemoryBudget`]s over a channel
//! - [`CacheStats`]: a [`CacheObserver`](crate::application::port::CacheObserver)
//!   counting hits, misses and refill steps

mod memory_monitor;
mod stats;

pub use memory_monitor::{MemoryBudget, MemoryMonitor, MemoryShare, SamplingInterval};
pub use stats::{CacheStats, CacheStatsSnapshot};
