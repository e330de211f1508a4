use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::utils::error::JournalError;

impl JournalError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            JournalError::AuthError { .. } | JournalError::TokenError(_) => StatusCode::UNAUTHORIZED,
            JournalError::ValidationError { .. } | JournalError::ConflictError { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for JournalError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 內部錯誤只寫入日誌，不回傳細節
        let message = match &self {
            JournalError::AuthError { message }
            | JournalError::ValidationError { message }
            | JournalError::ConflictError { message } => message.clone(),
            JournalError::TokenError(_) => "Invalid token".to_string(),
            other => {
                tracing::error!("❌ Request failed: {} (Category: {:?})", other, other.category());
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
