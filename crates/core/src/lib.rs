//! Lorry Desk Core - freight booking types and engines.
//!
//! This crate provides the domain model and the pure engines shared by the
//! other Lorry Desk components:
//! - `admin` - JSON API service for the dashboard
//! - `cli` - Offline quoting, repricing and reporting tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! persistence, no clocks. Callers pass a [`QueryContext`] carrying the
//! organization, branch and "now" into every filter and aggregation.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, statuses, money formatting and mobile numbers
//! - [`models`] - Bookings, articles, OGPLs, branches and customers
//! - [`pricing`] - Booking totals and bulk rate adjustment
//! - [`filter`] - Multi-criteria filters and date ranges
//! - [`sort`] - Stable sorting and pagination
//! - [`analytics`] - Zero-filled time buckets and revenue breakdowns

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod context;
pub mod filter;
pub mod models;
pub mod pricing;
pub mod sort;
pub mod types;

pub use context::QueryContext;
pub use types::*;
