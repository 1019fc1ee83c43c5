//! Submission lifecycle: intake, deletion and the dashboard roll-up.
//!
//! # Intake order
//!
//! 1. Required text fields and files are present
//! 2. Every field rule passes
//! 3. File types are acceptable
//! 4. Files are written, then the record is inserted
//!
//! Nothing touches the disk or the store until steps 1-3 pass. If a write or
//! the insert fails, files already written for the request are removed again.

use std::collections::HashMap;

use axum::body::Bytes;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, FieldErrors},
    models::submission::{
        DashboardSummary, DeletionReport, FormVariant, NewSubmission, Submission,
        SubmissionDocuments,
    },
    repository::SubmissionStore,
    storage::{
        self, BANK_DETAILS_DIR, COMMERCIAL_REGISTER_DIR, FileRemoval, LOGO_DIR, UploadStore,
    },
    validation::{missing_vendor_fields, validate_vendor_form},
};

pub const LOGO_FIELD: &str = "logo";
pub const BANK_DETAILS_FIELD: &str = "bankDetails";
pub const COMMERCIAL_REGISTER_FIELD: &str = "commercialRegister";

/// Logo upload limit: 10 MiB.
pub const MAX_LOGO_BYTES: usize = 10 * 1024 * 1024;
/// Per-PDF upload limit: 20 MiB.
pub const MAX_DOCUMENT_BYTES: usize = 20 * 1024 * 1024;

/// Dashboard "recent" list length.
const RECENT_LIMIT: i64 = 5;

const REQUIRED_FILES: [&str; 3] = [LOGO_FIELD, BANK_DETAILS_FIELD, COMMERCIAL_REGISTER_FIELD];

/// One uploaded file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied name; only its extension is ever used.
    pub file_name: String,
    pub bytes: Bytes,
}

/// Everything read from the intake multipart body.
#[derive(Debug, Default)]
pub struct IntakeForm {
    pub fields: HashMap<String, String>,
    /// Non-empty file parts by field name.
    pub files: HashMap<String, UploadedFile>,
}

/// Whether `field` is one of the intake's file parts under `variant`.
pub fn is_file_field(field: &str, variant: FormVariant) -> bool {
    REQUIRED_FILES.contains(&field) || field == variant.supplementary_field()
}

/// Upload size limit for a file field.
pub fn size_limit(field: &str) -> usize {
    if field == LOGO_FIELD {
        MAX_LOGO_BYTES
    } else {
        MAX_DOCUMENT_BYTES
    }
}

fn missing(message: &str, names: &[&str]) -> AppError {
    let fields = names
        .iter()
        .map(|name| (name.to_string(), vec!["This field is required".to_string()]))
        .collect();
    AppError::Validation {
        message: message.to_string(),
        fields,
    }
}

fn file_error(field: &str, message: &str) -> AppError {
    let mut fields = FieldErrors::new();
    fields.insert(field.to_string(), vec![message.to_string()]);
    AppError::Validation {
        message: message.to_string(),
        fields,
    }
}

/// Validate an intake form, store its files and create the record.
pub async fn create_submission(
    store: &dyn SubmissionStore,
    uploads: &UploadStore,
    mut form: IntakeForm,
) -> Result<Submission, AppError> {
    let variant = uploads.variant();

    let missing_fields = missing_vendor_fields(&form.fields, variant);
    if !missing_fields.is_empty() {
        return Err(missing("Missing required fields", &missing_fields));
    }

    let missing_files: Vec<&str> = REQUIRED_FILES
        .into_iter()
        .filter(|name| !form.files.contains_key(*name))
        .collect();
    if !missing_files.is_empty() {
        return Err(missing("Missing required files", &missing_files));
    }

    let validated = validate_vendor_form(&form.fields, variant)?;

    let (Some(logo), Some(bank_details), Some(commercial_register)) = (
        form.files.remove(LOGO_FIELD),
        form.files.remove(BANK_DETAILS_FIELD),
        form.files.remove(COMMERCIAL_REGISTER_FIELD),
    ) else {
        return Err(missing("Missing required files", &REQUIRED_FILES));
    };
    let supplementary = form.files.remove(variant.supplementary_field());

    if !storage::is_valid_image_type(&logo.file_name) {
        return Err(file_error(LOGO_FIELD, "Invalid logo file type"));
    }
    for (field, file) in [
        (BANK_DETAILS_FIELD, &bank_details),
        (COMMERCIAL_REGISTER_FIELD, &commercial_register),
    ] {
        if !storage::is_valid_pdf_type(&file.file_name) {
            return Err(file_error(
                field,
                "Bank details and commercial register must be PDF files",
            ));
        }
    }
    if supplementary
        .as_ref()
        .is_some_and(|file| !storage::is_valid_pdf_type(&file.file_name))
    {
        let message = match variant {
            FormVariant::Stock => "Return policy must be a PDF file",
            FormVariant::Policy => "Tax certificate must be a PDF file",
        };
        return Err(file_error(variant.supplementary_field(), message));
    }

    let mut written = Vec::new();
    let documents = [
        (LOGO_DIR, &logo),
        (BANK_DETAILS_DIR, &bank_details),
        (COMMERCIAL_REGISTER_DIR, &commercial_register),
    ];

    let result = async {
        for (dir, file) in documents {
            let path = uploads.save(dir, &file.file_name, &file.bytes).await?;
            written.push(path);
        }
        if let Some(file) = &supplementary {
            let path = uploads
                .save(variant.supplementary_dir(), &file.file_name, &file.bytes)
                .await?;
            written.push(path);
        }

        let form = validated.form;
        let new_submission = NewSubmission {
            designer_name: form.designer_name,
            email: form.email,
            phone_number: form.phone_number,
            city: form.city,
            brand_name: form.brand_name,
            category: form.category,
            store_link: form.store_link,
            brand_story: form.brand_story,
            fulfillment_method: form.fulfillment_method,
            business: validated.business,
            documents: SubmissionDocuments {
                logo_path: written[0].clone(),
                bank_details_path: written[1].clone(),
                commercial_register_path: written[2].clone(),
                supplementary_document_path: written.get(3).cloned(),
            },
        };

        Ok::<_, AppError>(store.create(new_submission).await?)
    }
    .await;

    match result {
        Ok(submission) => {
            tracing::info!(
                submission_id = %submission.id,
                brand = %submission.brand_name,
                files = written.len(),
                "submission created"
            );
            Ok(submission)
        }
        Err(e) => {
            discard_files(uploads, &written).await;
            Err(e)
        }
    }
}

/// Best-effort removal of files written by a failed intake.
async fn discard_files(uploads: &UploadStore, paths: &[String]) {
    for path in paths {
        if let Err(e) = uploads.remove(path).await {
            tracing::warn!(path = %path, error = %e, "failed to remove orphaned upload");
        }
    }
}

/// Delete a submission and its files.
///
/// Each file is removed on its own; a missing file is fine and a failure is
/// logged and reported. The record is deleted regardless.
pub async fn delete_submission(
    store: &dyn SubmissionStore,
    uploads: &UploadStore,
    id: Uuid,
) -> Result<DeletionReport, AppError> {
    let submission = store
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Submission"))?;

    let mut report = DeletionReport::default();
    for path in submission.documents.paths() {
        match uploads.remove(path).await {
            Ok(FileRemoval::Removed) => report.removed_files.push(path.to_string()),
            Ok(FileRemoval::AlreadyGone) => {
                tracing::warn!(submission_id = %id, path, "document already missing");
                report.missing_files.push(path.to_string());
            }
            Err(e) => {
                tracing::error!(submission_id = %id, path, error = %e, "failed to remove document");
                report.failed_files.push(path.to_string());
            }
        }
    }

    if !store.delete(id).await? {
        return Err(AppError::NotFound("Submission"));
    }

    tracing::info!(
        submission_id = %id,
        removed = report.removed_files.len(),
        missing = report.missing_files.len(),
        failed = report.failed_files.len(),
        "submission deleted"
    );
    Ok(report)
}

/// Start instants of the current reporting periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodStarts {
    /// Most recent Sunday, 00:00 local time.
    pub week: DateTime<Utc>,
    /// Day 1 of the current month, 00:00 local time.
    pub month: DateTime<Utc>,
}

/// Compute the week and month starts for `now` in its own time zone.
pub fn period_starts<Tz: TimeZone>(now: &DateTime<Tz>) -> PeriodStarts {
    let tz = now.timezone();
    let today = now.date_naive();

    let week = today - Days::new(u64::from(today.weekday().num_days_from_sunday()));
    let month = today.with_day(1).unwrap_or(today);

    let midnight = |date: NaiveDate| {
        let naive = date.and_time(NaiveTime::MIN);
        // A DST gap can swallow midnight; fall back to reading it as UTC
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    };

    PeriodStarts {
        week: midnight(week),
        month: midnight(month),
    }
}

/// Totals for the dashboard cards plus the newest submissions.
pub async fn dashboard_summary(
    store: &dyn SubmissionStore,
    periods: PeriodStarts,
) -> Result<DashboardSummary, AppError> {
    let total_submissions = store.count_since(None).await?;
    let this_week = store.count_since(Some(periods.week)).await?;
    let this_month = store.count_since(Some(periods.month)).await?;
    let recent_submissions = store.recent(RECENT_LIMIT).await?;

    Ok(DashboardSummary {
        total_submissions,
        this_week,
        this_month,
        recent_submissions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;
    use chrono::FixedOffset;

    fn valid_fields() -> HashMap<String, String> {
        [
            ("designerName", "Layla Hassan"),
            ("email", "layla@example.com"),
            ("city", "Riyadh"),
            ("category", "fashion"),
            ("brandName", "Sadu House"),
            ("phoneNumber", "+966 500 000 000"),
            ("brandStory", "A family workshop weaving Sadu textiles for modern homes since 1998."),
            ("fulfillmentMethod", "self"),
            ("stockAvailability", "in-stock"),
            ("branchCount", "2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            bytes: Bytes::from_static(b"content"),
        }
    }

    fn valid_form() -> IntakeForm {
        IntakeForm {
            fields: valid_fields(),
            files: [
                (LOGO_FIELD, file("logo.png")),
                (BANK_DETAILS_FIELD, file("bank.pdf")),
                (COMMERCIAL_REGISTER_FIELD, file("cr.pdf")),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        }
    }

    fn uploads() -> (tempfile::TempDir, UploadStore) {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadStore::open(dir.path(), FormVariant::Stock).unwrap();
        (dir, uploads)
    }

    fn stored_file_count(uploads: &UploadStore) -> usize {
        uploads
            .categories()
            .iter()
            .map(|dir| {
                std::fs::read_dir(uploads.root().join(dir))
                    .map(|entries| entries.count())
                    .unwrap_or(0)
            })
            .sum()
    }

    #[tokio::test]
    async fn valid_intake_writes_files_and_record() {
        let (_dir, uploads) = uploads();
        uploads.ensure_dirs().await.unwrap();
        let store = MemoryStore::new();

        let mut form = valid_form();
        form.files.insert("returnPolicy".into(), file("returns.pdf"));
        let submission = create_submission(&store, &uploads, form).await.unwrap();

        assert_eq!(submission.documents.paths().len(), 4);
        for path in submission.documents.paths() {
            assert!(uploads.resolve(path).unwrap().is_file());
        }
        assert!(
            submission
                .documents
                .supplementary_document_path
                .as_deref()
                .unwrap()
                .starts_with("return-policies/")
        );
        assert!(store.find_by_id(submission.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rejected_intake_leaves_no_trace() {
        let (_dir, uploads) = uploads();
        uploads.ensure_dirs().await.unwrap();
        let store = MemoryStore::new();

        let mut bad_email = valid_form();
        bad_email.fields.insert("email".into(), "not-an-email".into());
        let mut bad_logo = valid_form();
        bad_logo.files.insert(LOGO_FIELD.into(), file("logo.gif"));
        let mut bad_pdf = valid_form();
        bad_pdf.files.insert(BANK_DETAILS_FIELD.into(), file("bank.docx"));
        let mut no_register = valid_form();
        no_register.files.remove(COMMERCIAL_REGISTER_FIELD);
        let mut no_city = valid_form();
        no_city.fields.remove("city");

        for form in [bad_email, bad_logo, bad_pdf, no_register, no_city] {
            let result = create_submission(&store, &uploads, form).await;
            assert!(matches!(result, Err(AppError::Validation { .. })));
        }

        assert_eq!(store.count_since(None).await.unwrap(), 0);
        assert_eq!(stored_file_count(&uploads), 0);
    }

    #[tokio::test]
    async fn missing_parts_are_named() {
        let (_dir, uploads) = uploads();
        let store = MemoryStore::new();

        let mut form = valid_form();
        form.files.remove(LOGO_FIELD);
        match create_submission(&store, &uploads, form).await {
            Err(AppError::Validation { message, fields }) => {
                assert_eq!(message, "Missing required files");
                assert!(fields.contains_key("logo"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_write_removes_earlier_files() {
        let (_dir, uploads) = uploads();
        // Only the logo directory exists, so the bank-details write fails
        std::fs::create_dir_all(uploads.root().join(LOGO_DIR)).unwrap();
        let store = MemoryStore::new();

        let result = create_submission(&store, &uploads, valid_form()).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(stored_file_count(&uploads), 0);
        assert_eq!(store.count_since(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_tolerates_missing_files() {
        let (_dir, uploads) = uploads();
        uploads.ensure_dirs().await.unwrap();
        let store = MemoryStore::new();
        let submission = create_submission(&store, &uploads, valid_form())
            .await
            .unwrap();

        let logo = uploads.resolve(&submission.documents.logo_path).unwrap();
        std::fs::remove_file(&logo).unwrap();

        let report = delete_submission(&store, &uploads, submission.id)
            .await
            .unwrap();
        assert_eq!(report.missing_files, vec![submission.documents.logo_path.clone()]);
        assert_eq!(report.removed_files.len(), 2);
        assert!(report.failed_files.is_empty());
        assert!(store.find_by_id(submission.id).await.unwrap().is_none());

        let again = delete_submission(&store, &uploads, submission.id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[test]
    fn week_starts_on_sunday_midnight() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        // Wednesday 2025-06-18 15:30 +03:00
        let now = tz.with_ymd_and_hms(2025, 6, 18, 15, 30, 0).unwrap();
        let periods = period_starts(&now);

        assert_eq!(
            periods.week,
            tz.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(
            periods.month,
            tz.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn sunday_is_its_own_week_start() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let periods = period_starts(&now);
        assert_eq!(periods.week, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(periods.week, periods.month);
    }

    #[tokio::test]
    async fn dashboard_counts_and_recent() {
        let (_dir, uploads) = uploads();
        uploads.ensure_dirs().await.unwrap();
        let store = MemoryStore::new();
        for _ in 0..7 {
            create_submission(&store, &uploads, valid_form()).await.unwrap();
        }

        let summary = dashboard_summary(&store, period_starts(&Utc::now()))
            .await
            .unwrap();
        assert_eq!(summary.total_submissions, 7);
        assert_eq!(summary.this_week, 7);
        assert_eq!(summary.this_month, 7);
        assert_eq!(summary.recent_submissions.len(), 5);
    }
}
