//! Lorry Desk admin library.
//!
//! This crate provides the JSON API behind the freight dashboard as a
//! library, allowing it to be tested and reused:
//!
//! - `db` - data access and LR/OGPL numbering, with an in-memory store
//! - `services` - booking, catalog, trip and analytics operations
//! - `import_export` - article CSV import and CSV exports
//! - `routes` - axum handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod import_export;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod fixtures;
