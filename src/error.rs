use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum AdminError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Database connection was never established")]
    NotConnected,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Backup failed: {0}")]
    BackupFailed(String),

    #[error("Restore failed: {0}")]
    RestoreFailed(String),

    #[error("Reset failed: {0}")]
    ResetFailed(String),

    #[error("Operation not allowed")]
    Forbidden,

    #[error("Invalid data source: {0}")]
    InvalidSource(String),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Import failed: {0}")]
    ImportFailed(String),

    #[error("No file uploaded")]
    NoFile,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    /// Stable machine-readable code carried in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AdminError::DatabaseError(_) | AdminError::NotConnected => "DATABASE_ERROR",
            AdminError::NotFound(_) => "NOT_FOUND",
            AdminError::BackupFailed(_) => "BACKUP_FAILED",
            AdminError::RestoreFailed(_) => "RESTORE_FAILED",
            AdminError::ResetFailed(_) => "RESET_FAILED",
            AdminError::Forbidden => "FORBIDDEN",
            AdminError::InvalidSource(_) => "INVALID_SOURCE",
            AdminError::ExportFailed(_) => "EXPORT_FAILED",
            AdminError::ImportFailed(_) => "IMPORT_FAILED",
            AdminError::NoFile => "NO_FILE",
            AdminError::Io(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::Forbidden => StatusCode::FORBIDDEN,
            AdminError::InvalidSource(_) | AdminError::NoFile => StatusCode::BAD_REQUEST,
            AdminError::DatabaseError(_)
            | AdminError::NotConnected
            | AdminError::BackupFailed(_)
            | AdminError::RestoreFailed(_)
            | AdminError::ResetFailed(_)
            | AdminError::ExportFailed(_)
            | AdminError::ImportFailed(_)
            | AdminError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AdminError::DatabaseError(_) | AdminError::NotConnected => {
                "Database error".to_string()
            }
            AdminError::NotFound(what) => format!("{what} not found"),
            AdminError::BackupFailed(_) => "Backup failed".to_string(),
            AdminError::RestoreFailed(_) => "Restore failed".to_string(),
            AdminError::ResetFailed(_) => "Reset failed".to_string(),
            AdminError::Forbidden => "Operation not allowed".to_string(),
            AdminError::InvalidSource(_) => "Invalid data source".to_string(),
            AdminError::ExportFailed(_) => "Export failed".to_string(),
            AdminError::ImportFailed(_) => "Import failed".to_string(),
            AdminError::NoFile => "No file uploaded".to_string(),
            AdminError::Io(_) => "An internal server error occurred.".to_string(),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "request failed");
        }
        let body = ApiErrorBody {
            code: self.code().to_string(),
            message: self.public_message(),
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
