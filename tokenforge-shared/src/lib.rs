//! # Tokenforge Shared Library
//!
//! This crate contains the data layer and business rules shared by the
//! Tokenforge API server and its integration tests.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `versioning`: The token write path (token upsert + version snapshot)
//! - `auth`: Session credentials, request authentication, project ownership
//! - `billing`: Payment provider webhook verification and reconciliation
//! - `quota`: Plan limits per subscription tier
//! - `export`: Rendering a token set as JSON/CSS/SCSS/Less/Tailwind
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod billing;
pub mod db;
pub mod export;
pub mod models;
pub mod quota;
pub mod versioning;

/// Current version of the Tokenforge shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
