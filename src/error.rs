use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("latitude and longitude are required")]
    MissingCoordinates,

    #[error("invalid numeric value for {0}")]
    InvalidNumeric(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MissingCoordinates | AppError::InvalidNumeric(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
