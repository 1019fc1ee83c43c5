//! HTTP request handlers (route handlers).
//!
//! Each handler extracts request data, delegates to a service or store and
//! returns a JSON envelope or an `AppError`.

/// Admin setup, login and session endpoints
pub mod auth;
/// Dashboard summary
pub mod dashboard;
/// Uploaded document download
pub mod files;
/// Liveness and store connectivity
pub mod health;
/// Vendor intake and admin submission management
pub mod submissions;
