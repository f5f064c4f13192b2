/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check
/// - `auth`: GitHub sign-in and the current user
/// - `projects`: Project listing, creation, deletion
/// - `tokens`: Token listing and the token write path
/// - `versions`: Version history
/// - `export`: Token set download in stylesheet/config formats
/// - `waitlist`: Public waitlist signup
/// - `billing`: Checkout sessions and payment webhooks

pub mod auth;
pub mod billing;
pub mod export;
pub mod health;
pub mod projects;
pub mod tokens;
pub mod versions;
pub mod waitlist;
