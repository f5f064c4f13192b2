/// Middleware for the API server
///
/// - `security`: Security headers on every response
/// - `method_not_allowed`: JSON bodies for 405 responses

pub mod method_not_allowed;
pub mod security;
