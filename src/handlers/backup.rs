use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::service::backups::{self, BackupRecord};
use crate::{AdminError, router::AdminState};

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct CompletedResponse {
    pub status: &'static str,
}

impl CompletedResponse {
    fn completed() -> Json<Self> {
        Json(Self {
            status: "completed",
        })
    }
}

/// POST /api/backup
pub async fn create_backup(
    State(state): State<AdminState>,
) -> Result<Json<BackupRecord>, AdminError> {
    let record = backups::create(&state.cli, &state.config.backup_dir).await?;
    Ok(Json(record))
}

/// POST /api/restore {filename}
pub async fn restore_backup(
    State(state): State<AdminState>,
    Json(req): Json<RestoreRequest>,
) -> Result<Json<CompletedResponse>, AdminError> {
    let path = backups::existing_backup(&state.config.backup_dir, &req.filename).await?;
    state
        .cli
        .load(&path)
        .await
        .map_err(|e| AdminError::RestoreFailed(e.to_string()))?;
    info!(filename = %req.filename, "backup restored");
    Ok(CompletedResponse::completed())
}

/// POST /api/reset -> reload the bundled schema file.
pub async fn reset_database(
    State(state): State<AdminState>,
) -> Result<Json<CompletedResponse>, AdminError> {
    let schema = &state.config.schema_path;
    if !tokio::fs::metadata(schema).await.is_ok_and(|m| m.is_file()) {
        return Err(AdminError::NotFound("Schema file"));
    }
    state
        .cli
        .load(schema)
        .await
        .map_err(|e| AdminError::ResetFailed(e.to_string()))?;
    info!(schema = %schema.display(), "database reset from schema");
    Ok(CompletedResponse::completed())
}

/// GET /api/backups -> newest first
pub async fn list_backups(
    State(state): State<AdminState>,
) -> Result<Json<Vec<BackupRecord>>, AdminError> {
    Ok(Json(backups::list(&state.config.backup_dir).await?))
}

/// GET /api/backup/{filename} -> the dump as an attachment.
pub async fn download_backup(
    State(state): State<AdminState>,
    Path(filename): Path<String>,
) -> Result<Response, AdminError> {
    let path = backups::existing_backup(&state.config.backup_dir, &filename).await?;
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| AdminError::NotFound("Backup file"))?;

    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', "_"));
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/sql")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
