//! Core types for Mercado.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;

pub use cart::{Cart, CartLine};
pub use email::{Email, EmailError};
pub use id::*;
