//! Keywarden Core - Shared types library.
//!
//! This crate provides common types used across the Keywarden components:
//! - `dashboard` - server-rendered operator panel for the license API
//! - `integration-tests` - black-box coverage of the panel
//!
//! # Architecture
//!
//! The core crate contains only types and calendar arithmetic - no I/O, no
//! HTTP clients, no async. Everything in here is deterministic and cheap to
//! unit test.
//!
//! # Modules
//!
//! - [`types`] - role and client-binding types
//! - [`expiry`] - expiry-date arithmetic behind the license forms

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod expiry;
pub mod types;

pub use types::*;
