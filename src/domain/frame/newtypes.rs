// SPDX-License-Identifier: MPL-2.0
//! Frame cache newtypes.
//!
//! This module provides type-safe wrappers for cache settings,
//! ensuring they are always within valid ranges.

// =============================================================================
// Memory Budget Bounds
// =============================================================================

/// Memory budget bounds (1 to 4096 MB).
pub mod memory_budget_bounds {
    /// Minimum memory budget in megabytes.
    pub const MIN: u32 = 1;
    /// Maximum memory budget in megabytes.
    pub const MAX: u32 = 4096;
    /// Default memory budget in megabytes.
    pub const DEFAULT: u32 = 64;
}

// =============================================================================
// MemoryBudgetMb
// =============================================================================

/// Memory budget in megabytes for the decoded frame cache of one animation.
///
/// This newtype enforces validity at the type level, ensuring the value
/// is always within the valid range (1–4096 MB).
///
/// # Example
///
/// ```
/// use animated_frames::domain::frame::MemoryBudgetMb;
///
/// let budget = MemoryBudgetMb::new(128);
/// assert_eq!(budget.value(), 128);
/// assert_eq!(budget.as_bytes(), 128 * 1024 * 1024);
///
/// // Values outside range are clamped
/// let too_high = MemoryBudgetMb::new(100_000);
/// assert_eq!(too_high.value(), 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemoryBudgetMb(u32);

impl MemoryBudgetMb {
    /// Creates a new memory budget, clamping to valid range.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Self(value.clamp(memory_budget_bounds::MIN, memory_budget_bounds::MAX))
    }

    /// Returns the value in megabytes.
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Returns the budget in bytes.
    #[must_use]
    pub fn as_bytes(self) -> u64 {
        u64::from(self.0) * 1024 * 1024
    }
}

impl Default for MemoryBudgetMb {
    fn default() -> Self {
        Self(memory_budget_bounds::DEFAULT)
    }
}

// =============================================================================
// WindowOverride
// =============================================================================

/// Optional hard cap on the number of resident frames.
///
/// Zero means "no explicit cap"; the sizing policy alone decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowOverride(usize);

impl WindowOverride {
    #[must_use]
    pub fn new(max_frames: usize) -> Self {
        Self(max_frames)
    }

    /// No cap.
    #[must_use]
    pub fn unlimited() -> Self {
        Self(0)
    }

    /// Returns the cap, or `None` when unset.
    #[must_use]
    pub fn limit(self) -> Option<usize> {
        (self.0 > 0).then_some(self.0)
    }

    /// Raw value as stored (0 = unset).
    #[must_use]
    pub fn value(self) -> usize {
        self.0
    }

    #[must_use]
    pub fn is_unlimited(self) -> bool {
        self.0 == 0
    }
}

impl From<Option<usize>> for WindowOverride {
    fn from(value: Option<usize>) -> Self {
        Self(value.unwrap_or(0))
    }
}

// =============================================================================
// Tests
// =============================================================================
