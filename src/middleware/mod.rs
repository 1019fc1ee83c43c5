//! HTTP middleware components.
//!
//! Middleware run before route handlers. Here they resolve the session
//! cookie into request-scoped context and short-circuit admin routes for
//! visitors without a session.

/// Session cookie authentication middleware
pub mod auth;
