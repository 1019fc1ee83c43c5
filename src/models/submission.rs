//! Vendor submission data models and API request/response types.
//!
//! This module defines:
//! - `Submission`: one vendor application as stored and returned to admins
//! - `BusinessProfile`: the two alternative shapes of the business section
//! - `SubmissionDocuments`: relative paths of the uploaded files
//! - `NewSubmission`: validated intake data handed to the store
//! - `SubmissionSummary`: the slim row used on the dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which business-section layout the intake form uses.
///
/// Records remember the variant they were created under, so switching the
/// configured variant never makes older records unreadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormVariant {
    /// Stock availability and branch count; optional return-policy PDF.
    #[default]
    Stock,
    /// Six policy acknowledgements; optional tax-certificate PDF.
    Policy,
}

impl FormVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormVariant::Stock => "stock",
            FormVariant::Policy => "policy",
        }
    }

    /// Multipart field name of the optional supplementary document.
    pub fn supplementary_field(&self) -> &'static str {
        match self {
            FormVariant::Stock => "returnPolicy",
            FormVariant::Policy => "taxCertificate",
        }
    }

    /// Upload subdirectory of the optional supplementary document.
    pub fn supplementary_dir(&self) -> &'static str {
        match self {
            FormVariant::Stock => "return-policies",
            FormVariant::Policy => "tax-certificates",
        }
    }
}

impl std::str::FromStr for FormVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stock" => Ok(FormVariant::Stock),
            "policy" => Ok(FormVariant::Policy),
            other => Err(format!("unknown form variant `{other}`")),
        }
    }
}

/// The six policy acknowledgements of the `policy` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAcknowledgements {
    pub product_image_policy: bool,
    pub return_refund_policy: bool,
    pub privacy_policy: bool,
    pub terms_of_use: bool,
    pub commission_shipping_policy: bool,
    pub whistleblowing_policy: bool,
}

/// Business section of a submission. Exactly one shape applies per record.
///
/// # JSON Example
///
/// ```json
/// { "formVariant": "stock", "stockAvailability": "in-stock", "branchCount": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "formVariant", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum BusinessProfile {
    Stock {
        stock_availability: String,
        branch_count: i32,
    },
    Policy(PolicyAcknowledgements),
}

impl BusinessProfile {
    pub fn variant(&self) -> FormVariant {
        match self {
            BusinessProfile::Stock { .. } => FormVariant::Stock,
            BusinessProfile::Policy(_) => FormVariant::Policy,
        }
    }
}

/// Relative paths (under the upload root) of a submission's files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDocuments {
    pub logo_path: String,
    pub bank_details_path: String,
    pub commercial_register_path: String,
    /// Return policy (`stock`) or tax certificate (`policy`).
    pub supplementary_document_path: Option<String>,
}

impl SubmissionDocuments {
    /// Every non-null document path, logo first.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths = vec![
            self.logo_path.as_str(),
            self.bank_details_path.as_str(),
            self.commercial_register_path.as_str(),
        ];
        if let Some(path) = self.supplementary_document_path.as_deref() {
            paths.push(path);
        }
        paths
    }
}

/// One vendor application.
///
/// # Lifecycle
///
/// Created once by the intake endpoint, never updated, and destroyed by an
/// admin delete which also removes the files in `documents`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub designer_name: String,
    pub email: String,
    pub phone_number: String,
    pub city: String,
    pub brand_name: String,
    pub category: String,
    pub store_link: Option<String>,
    pub brand_story: String,
    pub fulfillment_method: String,
    #[serde(flatten)]
    pub business: BusinessProfile,
    #[serde(flatten)]
    pub documents: SubmissionDocuments,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn summary(&self) -> SubmissionSummary {
        SubmissionSummary {
            id: self.id,
            designer_name: self.designer_name.clone(),
            brand_name: self.brand_name.clone(),
            category: self.category.clone(),
            created_at: self.created_at,
        }
    }
}

/// Validated intake data, before the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub designer_name: String,
    pub email: String,
    pub phone_number: String,
    pub city: String,
    pub brand_name: String,
    pub category: String,
    pub store_link: Option<String>,
    pub brand_story: String,
    pub fulfillment_method: String,
    pub business: BusinessProfile,
    pub documents: SubmissionDocuments,
}

impl NewSubmission {
    /// Materialize the record with a fresh id and both timestamps set to `now`.
    pub fn into_submission(self, id: Uuid, now: DateTime<Utc>) -> Submission {
        Submission {
            id,
            designer_name: self.designer_name,
            email: self.email,
            phone_number: self.phone_number,
            city: self.city,
            brand_name: self.brand_name,
            category: self.category,
            store_link: self.store_link,
            brand_story: self.brand_story,
            fulfillment_method: self.fulfillment_method,
            business: self.business,
            documents: self.documents,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Dashboard row: just enough to link to the full record.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub id: Uuid,
    pub designer_name: String,
    pub brand_name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Filters for the admin list endpoint.
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    /// Case-insensitive substring matched against designer name, brand name or email.
    pub search: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
}

/// One page of the admin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// `ceil(total / page_size)`, zero when there are no rows.
    pub fn total_pages(&self, total: i64) -> i64 {
        let size = i64::from(self.page_size.max(1));
        (total + size - 1) / size
    }
}

/// Response body of `GET /api/submissions`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPage {
    pub success: bool,
    pub data: Vec<Submission>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: i64,
}

/// Response body of `GET /api/dashboard`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_submissions: i64,
    pub this_week: i64,
    pub this_month: i64,
    pub recent_submissions: Vec<SubmissionSummary>,
}

/// Outcome of the file cleanup that precedes a record deletion.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub removed_files: Vec<String>,
    pub missing_files: Vec<String>,
    pub failed_files: Vec<String>,
}
