//! # Tokenforge API Server Library
//!
//! HTTP surface of Tokenforge: projects, design tokens, version history,
//! GitHub sign-in, billing and the waitlist.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with JSON rejections
//! - `middleware`: Security headers and 405 bodies
//! - `providers`: GitHub and Stripe clients
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod providers;
pub mod routes;
