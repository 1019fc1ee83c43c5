//! Admin account model.
//!
//! Admins authenticate with a username and password. Passwords are stored as
//! bcrypt hashes and never leave the server.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents an admin record from the database.
///
/// # Database Table
///
/// Maps to the `admins` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `username`: Unique login name
/// - `password_hash`: bcrypt hash of the password
/// - `created_at`: When the account was bootstrapped
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of an admin, returned by `GET /api/auth/me`.
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "username": "admin",
///   "createdAt": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Convert database Admin to the public AdminProfile.
///
/// This transformation removes the `password_hash` field.
impl From<Admin> for AdminProfile {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            created_at: admin.created_at,
        }
    }
}

/// Response body of `GET /api/auth/setup`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatus {
    pub setup_required: bool,
}
