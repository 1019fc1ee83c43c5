//! PostgreSQL store.
//!
//! Queries are checked at runtime (`query_as::<_, Row>`) so the crate builds
//! without a live database. Dynamic list filters go through `QueryBuilder`,
//! which binds every user-supplied value.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{AdminStore, StoreError, SubmissionStore};
use crate::{
    db::DbPool,
    models::{
        admin::Admin,
        submission::{
            BusinessProfile, FormVariant, NewSubmission, PageRequest, PolicyAcknowledgements,
            Submission, SubmissionDocuments, SubmissionFilter, SubmissionSummary,
        },
    },
};

/// Advisory lock key serializing admin bootstrap across connections.
const ADMIN_SETUP_LOCK: i64 = 0x5e7_a0d1;

const SUBMISSION_COLUMNS: &str = "id, designer_name, email, phone_number, city, brand_name, \
     category, store_link, brand_story, fulfillment_method, form_variant, stock_availability, \
     branch_count, product_image_policy, return_refund_policy, privacy_policy, terms_of_use, \
     commission_shipping_policy, whistleblowing_policy, logo_path, bank_details_path, \
     commercial_register_path, supplementary_document_path, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Raw `submissions` row. Variant-specific columns are nullable.
#[derive(Debug, sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    designer_name: String,
    email: String,
    phone_number: String,
    city: String,
    brand_name: String,
    category: String,
    store_link: Option<String>,
    brand_story: String,
    fulfillment_method: String,
    form_variant: String,
    stock_availability: Option<String>,
    branch_count: Option<i32>,
    product_image_policy: Option<bool>,
    return_refund_policy: Option<bool>,
    privacy_policy: Option<bool>,
    terms_of_use: Option<bool>,
    commission_shipping_policy: Option<bool>,
    whistleblowing_policy: Option<bool>,
    logo_path: String,
    bank_details_path: String,
    commercial_register_path: String,
    supplementary_document_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: &str| StoreError::CorruptRecord {
            id: row.id,
            reason: reason.to_string(),
        };

        let variant: FormVariant = row.form_variant.parse().map_err(|e: String| corrupt(&e))?;
        let business = match variant {
            FormVariant::Stock => BusinessProfile::Stock {
                stock_availability: row
                    .stock_availability
                    .clone()
                    .ok_or_else(|| corrupt("stock record without stock_availability"))?,
                branch_count: row
                    .branch_count
                    .ok_or_else(|| corrupt("stock record without branch_count"))?,
            },
            FormVariant::Policy => BusinessProfile::Policy(PolicyAcknowledgements {
                product_image_policy: row.product_image_policy.unwrap_or(false),
                return_refund_policy: row.return_refund_policy.unwrap_or(false),
                privacy_policy: row.privacy_policy.unwrap_or(false),
                terms_of_use: row.terms_of_use.unwrap_or(false),
                commission_shipping_policy: row.commission_shipping_policy.unwrap_or(false),
                whistleblowing_policy: row.whistleblowing_policy.unwrap_or(false),
            }),
        };

        Ok(Submission {
            id: row.id,
            designer_name: row.designer_name,
            email: row.email,
            phone_number: row.phone_number,
            city: row.city,
            brand_name: row.brand_name,
            category: row.category,
            store_link: row.store_link,
            brand_story: row.brand_story,
            fulfillment_method: row.fulfillment_method,
            business,
            documents: SubmissionDocuments {
                logo_path: row.logo_path,
                bank_details_path: row.bank_details_path,
                commercial_register_path: row.commercial_register_path,
                supplementary_document_path: row.supplementary_document_path,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Append the WHERE clause shared by the list and count queries.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &SubmissionFilter) {
    builder.push(" WHERE TRUE");

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (designer_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR brand_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        builder.push(" AND category = ").push_bind(category.to_string());
    }
}

#[async_trait]
impl SubmissionStore for PgStore {
    async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let (stock_availability, branch_count, policies) = match &submission.business {
            BusinessProfile::Stock {
                stock_availability,
                branch_count,
            } => (Some(stock_availability.clone()), Some(*branch_count), None),
            BusinessProfile::Policy(acks) => (None, None, Some(*acks)),
        };
        let policy = |pick: fn(&PolicyAcknowledgements) -> bool| policies.as_ref().map(pick);

        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            INSERT INTO submissions (
                id, designer_name, email, phone_number, city, brand_name, category,
                store_link, brand_story, fulfillment_method, form_variant,
                stock_availability, branch_count,
                product_image_policy, return_refund_policy, privacy_policy, terms_of_use,
                commission_shipping_policy, whistleblowing_policy,
                logo_path, bank_details_path, commercial_register_path, supplementary_document_path
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&submission.designer_name)
        .bind(&submission.email)
        .bind(&submission.phone_number)
        .bind(&submission.city)
        .bind(&submission.brand_name)
        .bind(&submission.category)
        .bind(&submission.store_link)
        .bind(&submission.brand_story)
        .bind(&submission.fulfillment_method)
        .bind(submission.business.variant().as_str())
        .bind(stock_availability)
        .bind(branch_count)
        .bind(policy(|p| p.product_image_policy))
        .bind(policy(|p| p.return_refund_policy))
        .bind(policy(|p| p.privacy_policy))
        .bind(policy(|p| p.terms_of_use))
        .bind(policy(|p| p.commission_shipping_policy))
        .bind(policy(|p| p.whistleblowing_policy))
        .bind(&submission.documents.logo_path)
        .bind(&submission.documents.bank_details_path)
        .bind(&submission.documents.commercial_register_path)
        .bind(&submission.documents.supplementary_document_path)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Submission::try_from).transpose()
    }

    async fn list(
        &self,
        filter: &SubmissionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Submission>, i64), StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM submissions");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions"
        ));
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build_query_as::<SubmissionRow>()
            .fetch_all(&self.pool)
            .await?;

        let submissions = rows
            .into_iter()
            .map(Submission::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((submissions, total))
    }

    async fn count_since(&self, since: Option<DateTime<Utc>>) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM submissions WHERE $1::timestamptz IS NULL OR created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<SubmissionSummary>, StoreError> {
        let rows = sqlx::query_as::<_, SubmissionSummary>(
            r#"
            SELECT id, designer_name, brand_name, category, created_at
            FROM submissions
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AdminStore for PgStore {
    async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_first(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<Admin>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Held until commit/rollback; concurrent bootstraps queue here
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ADMIN_SETUP_LOCK)
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins")
            .fetch_one(&mut *tx)
            .await?;

        if existing > 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (id, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(admin))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>, StoreError> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, username, password_hash, created_at FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, username, password_hash, created_at FROM admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }
}
