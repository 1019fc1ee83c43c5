//! Dashboard summary endpoint.

use axum::{Json, extract::State};
use chrono::Local;

use crate::{
    AppState,
    error::AppError,
    models::{ApiResponse, submission::DashboardSummary},
    services::submission_service::{self, period_starts},
};

/// Submission counts for the dashboard cards.
///
/// Weeks start on Sunday and months on day 1, both at local midnight.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "totalSubmissions": 42,
///     "thisWeek": 3,
///     "thisMonth": 11,
///     "recentSubmissions": [
///       { "id": "…", "designerName": "Layla", "brandName": "Sadu House", "category": "crafts", "createdAt": "…" }
///     ]
///   }
/// }
/// ```
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardSummary>>, AppError> {
    let periods = period_starts(&Local::now());
    let summary = submission_service::dashboard_summary(state.submissions.as_ref(), periods).await?;
    Ok(Json(ApiResponse::ok(summary)))
}
