// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Frame Cache**: Memory budget and memory-warning behaviour
//! - **Frame Timing**: Delay normalisation for animation frames
//! - **Memory Monitor**: System memory sampling

// ==========================================================================
// Frame Cache Defaults
// ==========================================================================

/// Default memory budget in megabytes for one animation's decoded frames.
pub const DEFAULT_MEMORY_BUDGET_MB: u32 = 64;

/// Minimum memory budget in megabytes.
pub const MIN_MEMORY_BUDGET_MB: u32 = 1;

/// Maximum memory budget in megabytes.
pub const MAX_MEMORY_BUDGET_MB: u32 = 4096;

/// Window size applied right after a memory warning (multi-frame sources).
pub const FRAMES_AFTER_MEMORY_WARNING: usize = 2;

/// Default delay before a memory-warning cap is lifted (in seconds).
pub const DEFAULT_MEMORY_WARNING_RESET_SECS: u64 = 10;

/// Minimum memory-warning reset delay (in seconds).
pub const MIN_MEMORY_WARNING_RESET_SECS: u64 = 1;

/// Maximum memory-warning reset delay (in seconds).
pub const MAX_MEMORY_WARNING_RESET_SECS: u64 = 300;

// ==========================================================================
// Frame Timing Defaults
// ==========================================================================

/// Delays shorter than this are treated as unspecified (in milliseconds).
pub const MIN_FRAME_DELAY_MS: u64 = 20;

/// Delay substituted for unspecified or too-short delays (in milliseconds).
pub const DEFAULT_FRAME_DELAY_MS: u64 = 100;

// ==========================================================================
// Memory Monitor Defaults
// ==========================================================================

/// Share of currently available system memory offered to one animation.
pub const DEFAULT_SYSTEM_MEMORY_PERCENT: u8 = 10;

/// Minimum share of available memory.
pub const MIN_SYSTEM_MEMORY_PERCENT: u8 = 1;

/// Maximum share of available memory.
pub const MAX_SYSTEM_MEMORY_PERCENT: u8 = 50;

/// Default interval between memory samples (in milliseconds).
pub const DEFAULT_SAMPLING_INTERVAL_MS: u64 = 2_000;

/// Minimum sampling interval (in milliseconds).
pub const MIN_SAMPLING_INTERVAL_MS: u64 = 100;

/// Maximum sampling interval (in milliseconds).
pub const MAX_SAMPLING_INTERVAL_MS: u64 = 60_000;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    // Frame cache validation
    assert!(MIN_MEMORY_BUDGET_MB > 0);
    assert!(MAX_MEMORY_BUDGET_MB >= MIN_MEMORY_BUDGET_MB);
    assert!(DEFAULT_MEMORY_BUDGET_MB >= MIN_MEMORY_BUDGET_MB);
    assert!(DEFAULT_MEMORY_BUDGET_MB <= MAX_MEMORY_BUDGET_MB);
    assert!(FRAMES_AFTER_MEMORY_WARNING >= 1);
    assert!(MIN_MEMORY_WARNING_RESET_SECS > 0);
    assert!(DEFAULT_MEMORY_WARNING_RESET_SECS >= MIN_MEMORY_WARNING_RESET_SECS);
    assert!(DEFAULT_MEMORY_WARNING_RESET_SECS <= MAX_MEMORY_WARNING_RESET_SECS);

    // Frame timing validation
    assert!(MIN_FRAME_DELAY_MS > 0);
    assert!(DEFAULT_FRAME_DELAY_MS >= MIN_FRAME_DELAY_MS);

    // Memory monitor validation
    assert!(MIN_SYSTEM_MEMORY_PERCENT > 0);
    assert!(MAX_SYSTEM_MEMORY_PERCENT <= 100);
    assert!(DEFAULT_SYSTEM_MEMORY_PERCENT >= MIN_SYSTEM_MEMORY_PERCENT);
    assert!(DEFAULT_SYSTEM_MEMORY_PERCENT <= MAX_SYSTEM_MEMORY_PERCENT);
    assert!(MIN_SAMPLING_INTERVAL_MS > 0);
    assert!(DEFAULT_SAMPLING_INTERVAL_MS >= MIN_SAMPLING_INTERVAL_MS);
    assert!(DEFAULT_SAMPLING_INTERVAL_MS <= MAX_SAMPLING_INTERVAL_MS);
};
