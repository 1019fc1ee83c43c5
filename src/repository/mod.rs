//! Persistence boundary for submissions and admin accounts.
//!
//! Handlers and services only see the [`SubmissionStore`] and [`AdminStore`]
//! traits. Two backends implement them:
//! - [`postgres::PgStore`]: the production datastore (sqlx + PostgreSQL)
//! - [`memory::MemoryStore`]: a process-local store used when no
//!   `DATABASE_URL` is configured, and by the test suite

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    admin::Admin,
    submission::{NewSubmission, PageRequest, Submission, SubmissionFilter, SubmissionSummary},
};

pub mod memory;
pub mod postgres;

/// Datastore failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row does not describe a valid record (e.g. unknown variant tag).
    #[error("corrupt record {id}: {reason}")]
    CorruptRecord { id: Uuid, reason: String },
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Insert a record, assigning its id and timestamps.
    async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Submission>, StoreError>;

    /// One page of matching records, newest first, plus the total match count.
    async fn list(
        &self,
        filter: &SubmissionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Submission>, i64), StoreError>;

    /// Records created at or after `since`; all records when `None`.
    async fn count_since(&self, since: Option<DateTime<Utc>>) -> Result<i64, StoreError>;

    /// The `limit` newest records.
    async fn recent(&self, limit: i64) -> Result<Vec<SubmissionSummary>, StoreError>;

    /// Delete by id. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Connectivity probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn count(&self) -> Result<i64, StoreError>;

    /// Create the bootstrap admin, unless one already exists.
    ///
    /// The existence check and the insert are atomic: of several concurrent
    /// calls at most one returns `Some`.
    async fn create_first(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<Admin>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, StoreError>;
}
