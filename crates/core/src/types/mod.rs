//! Core types for Keywarden.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod binding;
pub mod role;

pub use binding::IpPort;
pub use role::Role;
