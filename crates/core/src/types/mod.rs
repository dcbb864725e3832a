//! Core types for Lorry Desk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod mobile;
pub mod money;
pub mod status;

pub use id::*;
pub use mobile::{MobileError, MobileNumber};
pub use money::{CurrencyCode, Money, format_amount};
pub use status::*;
