// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core types with ZERO external dependencies.
//!
//! This module contains pure value objects and rules. It has no dependencies
//! on external crates (except `std`) so it can be tested in isolation.
//!
//! # Modules
//!
//! - [`frame`]: Frame types ([`DecodedFrame`](frame::DecodedFrame),
//!   [`CanvasSize`](frame::CanvasSize), [`MemoryBudgetMb`](frame::MemoryBudgetMb),
//!   [`WindowOverride`](frame::WindowOverride))

pub mod frame;
