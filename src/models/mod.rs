//! Data models representing database entities and API envelopes.

use serde::Serialize;

/// Admin account model
pub mod admin;
/// Vendor submission model
pub mod submission;

/// Success envelope shared by every JSON endpoint.
///
/// ```json
/// { "success": true, "data": { "id": "..." }, "message": "Submission created successfully" }
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Success without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// `{ "id": ... }` payload returned after a record is created.
#[derive(Debug, Serialize)]
pub struct CreatedId {
    pub id: uuid::Uuid,
}
