// SPDX-License-Identifier: MPL-2.0
//! System memory sampling for cache budgets.
//!
//! [`MemoryMonitor`] samples available system memory on a background thread
//! and publishes a [`MemoryBudget`] (a share of what is available) at a fixed
//! interval. The application forwards budgets to
//! [`AnimatedImage::set_memory_budget`](crate::animated::AnimatedImage::set_memory_budget).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use sysinfo::System;

use crate::config::{
    DEFAULT_SAMPLING_INTERVAL_MS, DEFAULT_SYSTEM_MEMORY_PERCENT, MAX_SAMPLING_INTERVAL_MS,
    MAX_SYSTEM_MEMORY_PERCENT, MIN_SAMPLING_INTERVAL_MS, MIN_SYSTEM_MEMORY_PERCENT,
};
use crate::error::Result;

/// Sampling interval for memory monitoring.
///
/// This newtype enforces validity at the type level, ensuring the value
/// is always within the valid range (100ms–60000ms).
///
/// # Example
///
/// ```
/// use animated_frames::diagnostics::SamplingInterval;
///
/// let interval = SamplingInterval::new(1000);
/// assert_eq!(interval.value(), 1000);
///
/// // Values outside range are clamped
/// let too_low = SamplingInterval::new(10);
/// assert_eq!(too_low.value(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingInterval(u64);

impl SamplingInterval {
    /// Creates a new sampling interval, clamping to valid range.
    #[must_use]
    pub fn new(value_ms: u64) -> Self {
        Self(value_ms.clamp(MIN_SAMPLING_INTERVAL_MS, MAX_SAMPLING_INTERVAL_MS))
    }

    /// Returns the value in milliseconds.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl Default for SamplingInterval {
    fn default() -> Self {
        Self(DEFAULT_SAMPLING_INTERVAL_MS)
    }
}

/// Share of available memory offered to frame caches, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryShare(u8);

impl MemoryShare {
    /// Creates a share, clamping to the valid range (1–50 %).
    #[must_use]
    pub fn new(percent: u8) -> Self {
        Self(percent.clamp(MIN_SYSTEM_MEMORY_PERCENT, MAX_SYSTEM_MEMORY_PERCENT))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Applies the share to `available_bytes`.
    #[must_use]
    pub fn of(self, available_bytes: u64) -> u64 {
        available_bytes / 100 * u64::from(self.0)
    }
}

impl Default for MemoryShare {
    fn default() -> Self {
        Self(DEFAULT_SYSTEM_MEMORY_PERCENT)
    }
}

/// One memory sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBudget {
    /// Memory the OS reports as available.
    pub available_bytes: u64,
    /// Budget derived from `available_bytes`.
    pub budget_bytes: u64,
}

impl MemoryBudget {
    #[must_use]
    pub fn from_available(available_bytes: u64, share: MemoryShare) -> Self {
        Self {
            available_bytes,
            budget_bytes: share.of(available_bytes),
        }
    }
}

/// Commands that can be sent to the monitor thread.
#[derive(Debug, Clone, Copy)]
enum MonitorCommand {
    Stop,
}

/// Samples system memory on a background thread.
///
/// Started with [`MemoryMonitor::start`]; stopped by [`MemoryMonitor::stop`]
/// or by dropping it.
pub struct MemoryMonitor {
    command_tx: Sender<MonitorCommand>,
    thread_handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl MemoryMonitor {
    /// Starts a monitor that sends a budget to `budget_tx` every `interval`.
    ///
    /// Samples are dropped while `budget_tx` is full.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the thread cannot be spawned.
    pub fn start(
        interval: SamplingInterval,
        share: MemoryShare,
        budget_tx: Sender<MemoryBudget>,
    ) -> Result<Self> {
        let (command_tx, command_rx) = bounded::<MonitorCommand>(1);
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let thread_handle = thread::Builder::new()
            .name("memory-monitor".into())
            .spawn(move || {
                Self::monitor_loop(interval, share, &budget_tx, &command_rx, &running_clone);
            })?;

        Ok(Self {
            command_tx,
            thread_handle: Some(thread_handle),
            running,
        })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops the monitor and waits for the thread to finish.
    pub fn stop(&mut self) {
        if self.is_running() {
            let _ = self.command_tx.send(MonitorCommand::Stop);
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    fn monitor_loop(
        interval: SamplingInterval,
        share: MemoryShare,
        budget_tx: &Sender<MemoryBudget>,
        command_rx: &Receiver<MonitorCommand>,
        running: &AtomicBool,
    ) {
        let mut sys = System::new();

        while running.load(Ordering::SeqCst) {
            sys.refresh_memory();
            let budget = MemoryBudget::from_available(sys.available_memory(), share);
            tracing::trace!(
                available = budget.available_bytes,
                budget = budget.budget_bytes,
                "memory sampled"
            );

            // Skip this sample if the receiver lags behind.
            let _ = budget_tx.try_send(budget);

            // Sleeping on the command channel makes stop immediate.
            match command_rx.recv_timeout(interval.as_duration()) {
                Ok(MonitorCommand::Stop) => break,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }

        running.store(false, Ordering::SeqCst);
    }
}

impl Drop for MemoryMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for MemoryMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMonitor")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
