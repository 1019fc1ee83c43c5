//! HTTP handlers for vendor submissions.
//!
//! `POST /api/submissions` is public; everything else here sits behind
//! `require_admin`.

use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    error::AppError,
    models::{
        ApiResponse, CreatedId,
        submission::{
            DeletionReport, FormVariant, PageRequest, Submission, SubmissionFilter, SubmissionPage,
        },
    },
    services::submission_service::{self, IntakeForm, UploadedFile, is_file_field, size_limit},
};

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

/// Query string of `GET /api/submissions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ListQuery {
    fn page_request(&self) -> Result<PageRequest, AppError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::InvalidRequest("page must be at least 1".into()));
        }

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::InvalidRequest(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(PageRequest { page, page_size })
    }
}

fn multipart_error(error: MultipartError) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::InvalidRequest(error.body_text())
    }
}

/// Drain the multipart body into text fields and non-empty file parts.
///
/// File parts are capped per field while streaming, so an oversized upload
/// is rejected before it is fully buffered.
async fn read_intake_form(
    mut multipart: Multipart,
    variant: FormVariant,
) -> Result<IntakeForm, AppError> {
    let mut form = IntakeForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if !is_file_field(&name, variant) {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, value);
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let limit = size_limit(&name);
        let mut buffer = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if buffer.len() + chunk.len() > limit {
                tracing::info!(field = %name, limit, "rejected oversized upload");
                return Err(AppError::PayloadTooLarge);
            }
            buffer.extend_from_slice(&chunk);
        }

        // An empty part is how browsers send an untouched file input
        if !buffer.is_empty() {
            form.files.insert(
                name,
                UploadedFile {
                    file_name,
                    bytes: Bytes::from(buffer),
                },
            );
        }
    }

    Ok(form)
}

/// Accept a vendor application.
///
/// # Request
///
/// `multipart/form-data` with the vendor text fields, the files `logo`,
/// `bankDetails`, `commercialRegister` and optionally `returnPolicy` or
/// `taxCertificate` depending on the form variant.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "data": { "id": "550e8400-e29b-41d4-a716-446655440000" },
///   "message": "Submission created successfully"
/// }
/// ```
///
/// The notification is sent after the response is produced and cannot fail it.
pub async fn create_submission(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<CreatedId>>, AppError> {
    let multipart = multipart.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    state.uploads.ensure_dirs().await?;

    let form = read_intake_form(multipart, state.uploads.variant()).await?;
    let submission =
        submission_service::create_submission(state.submissions.as_ref(), &state.uploads, form)
            .await?;

    let id = submission.id;
    state.notifier.dispatch(submission);

    Ok(Json(
        ApiResponse::ok(CreatedId { id }).with_message("Submission created successfully"),
    ))
}

/// List submissions, newest first.
///
/// # Query Parameters
///
/// - `page`: 1-based, default 1
/// - `pageSize`: 1 to 100, default 10
/// - `search`: case-insensitive match on designer name, brand name or email
/// - `category`: exact category
pub async fn list_submissions(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<SubmissionPage>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let page = query.page_request()?;

    let filter = SubmissionFilter {
        search: query.search,
        category: query.category,
    };

    let (data, total) = state.submissions.list(&filter, page).await?;

    Ok(Json(SubmissionPage {
        success: true,
        data,
        total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages(total),
    }))
}

/// An id that is not a UUID cannot name a submission.
fn submission_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound("Submission"))
}

/// Fetch one submission.
pub async fn get_submission(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<Submission>>, AppError> {
    let id = submission_id(path)?;

    let submission = state
        .submissions
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Submission"))?;

    Ok(Json(ApiResponse::ok(submission)))
}

/// Delete a submission and its documents.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "removedFiles": ["logos/1718000000000-3f2a.png"],
///     "missingFiles": [],
///     "failedFiles": []
///   },
///   "message": "Submission deleted successfully"
/// }
/// ```
pub async fn delete_submission(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<DeletionReport>>, AppError> {
    let id = submission_id(path)?;

    let report =
        submission_service::delete_submission(state.submissions.as_ref(), &state.uploads, id)
            .await?;

    Ok(Json(
        ApiResponse::ok(report).with_message("Submission deleted successfully"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_bounds() {
        let page = ListQuery::default().page_request().unwrap();
        assert_eq!(page, PageRequest { page: 1, page_size: 10 });

        let zero_page = ListQuery {
            page: Some(0),
            ..ListQuery::default()
        };
        assert!(zero_page.page_request().is_err());

        let huge = ListQuery {
            page_size: Some(101),
            ..ListQuery::default()
        };
        assert!(huge.page_request().is_err());

        let max = ListQuery {
            page_size: Some(100),
            ..ListQuery::default()
        };
        assert_eq!(max.page_request().unwrap().page_size, 100);
    }
}
