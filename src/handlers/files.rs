//! Authenticated download of uploaded documents.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::{AppState, error::AppError, storage::content_type_for};

/// Stream a stored file.
///
/// The path is resolved lexically against the upload root first, so a
/// traversal attempt is answered with 400 whether or not its target exists.
///
/// # Errors
///
/// - 400 `invalid_path` when the path escapes the upload root
/// - 404 `not_found` when nothing (or a directory) lives at the path
pub async fn serve_file(
    State(state): State<AppState>,
    Path(relative): Path<String>,
) -> Result<Response, AppError> {
    let path = state.uploads.resolve(&relative).ok_or_else(|| {
        tracing::warn!(path = %relative, "rejected file path outside the upload root");
        AppError::InvalidPath
    })?;

    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(AppError::NotFound("File"));
    }

    let file = tokio::fs::File::open(&path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("download")
        .replace('"', "");

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&path).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file_name}\""),
            ),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
