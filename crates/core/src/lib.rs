//! Mercado Core - Shared types library.
//!
//! This crate provides common types used across all Mercado components:
//! - `storefront` - Public-facing shop service
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails, plus the
//!   session cart value object

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
