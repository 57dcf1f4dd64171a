use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

const NO_FILE_MESSAGE: &str = "No file uploaded";
const PROCESSING_FAILED_MESSAGE: &str = "Failed to process file";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("Upload error: {0}")]
    Upload(String),
    #[error("File processing error: {0}")]
    FileProcessingError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Upload(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::Upload(_)
            | AppError::FileProcessingError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Details stay in the log; clients only see the fixed messages.
        let message = match &self {
            AppError::MissingFile => {
                tracing::error!("No file received.");
                NO_FILE_MESSAGE
            }
            other => {
                tracing::error!("Error processing file: {}", other);
                PROCESSING_FAILED_MESSAGE
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (self.status(), body).into_response()
    }
}
