// SPDX-License-Identifier: MPL-2.0
//! Application layer - ports between the frame cache and its collaborators.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The cache ([`crate::animated`]) only talks to codecs and observers
//!   through these traits

pub mod port;
