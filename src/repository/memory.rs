//! In-memory store.
//!
//! Keeps everything in process memory behind tokio locks. Used when the
//! server runs without `DATABASE_URL` and by the test suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{AdminStore, StoreError, SubmissionStore};
use crate::models::{
    admin::Admin,
    submission::{NewSubmission, PageRequest, Submission, SubmissionFilter, SubmissionSummary},
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    submissions: RwLock<Vec<Submission>>,
    admins: Mutex<Vec<Admin>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(submission: &Submission, filter: &SubmissionFilter) -> bool {
    let search_ok = match filter.search.as_deref().map(str::trim) {
        Some(needle) if !needle.is_empty() => {
            let needle = needle.to_lowercase();
            [
                &submission.designer_name,
                &submission.brand_name,
                &submission.email,
            ]
            .iter()
            .any(|haystack| haystack.to_lowercase().contains(&needle))
        }
        _ => true,
    };

    let category_ok = match filter.category.as_deref() {
        Some(category) if !category.is_empty() => submission.category == category,
        _ => true,
    };

    search_ok && category_ok
}

/// Newest first; among equal timestamps the later insert wins.
fn newest_first(rows: &[Submission]) -> Vec<&Submission> {
    let mut sorted: Vec<&Submission> = rows.iter().rev().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let submission = submission.into_submission(Uuid::new_v4(), Utc::now());
        self.submissions.write().await.push(submission.clone());
        Ok(submission)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        let rows = self.submissions.read().await;
        Ok(rows.iter().find(|s| s.id == id).cloned())
    }

    async fn list(
        &self,
        filter: &SubmissionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Submission>, i64), StoreError> {
        let rows = self.submissions.read().await;
        let matching: Vec<&Submission> = newest_first(&rows)
            .into_iter()
            .filter(|s| matches(s, filter))
            .collect();

        let total = matching.len() as i64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(0);
        let data = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok((data, total))
    }

    async fn count_since(&self, since: Option<DateTime<Utc>>) -> Result<i64, StoreError> {
        let rows = self.submissions.read().await;
        let count = rows
            .iter()
            .filter(|s| since.is_none_or(|since| s.created_at >= since))
            .count();
        Ok(count as i64)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<SubmissionSummary>, StoreError> {
        let rows = self.submissions.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(newest_first(&rows)
            .into_iter()
            .take(limit)
            .map(Submission::summary)
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.submissions.write().await;
        let before = rows.len();
        rows.retain(|s| s.id != id);
        Ok(rows.len() != before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.admins.lock().await.len() as i64)
    }

    async fn create_first(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<Admin>, StoreError> {
        let mut admins = self.admins.lock().await;
        if !admins.is_empty() {
            return Ok(None);
        }

        let admin = Admin {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        admins.push(admin.clone());
        Ok(Some(admin))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>, StoreError> {
        let admins = self.admins.lock().await;
        Ok(admins.iter().find(|a| a.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        let admins = self.admins.lock().await;
        Ok(admins.iter().find(|a| a.id == id).cloned())
    }
}
