use axum::extract::{FromRequest, Multipart, Request};
use axum::response::{IntoResponse, Response};
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::AdminError;
use crate::router::AdminState;

/// Multipart field carrying the uploaded spreadsheet.
pub const UPLOAD_FIELD: &str = "file";

/// An uploaded file spooled to a temporary file under the configured upload dir.
///
/// The file is deleted when this value is dropped, on every path.
#[derive(Debug)]
pub struct UploadedFile {
    file: NamedTempFile,
    pub file_name: Option<String>,
}

impl UploadedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete now and log a failure instead of leaving it to `Drop`.
    pub fn remove(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(path = %path.display(), error = %e, "failed to remove upload");
        }
    }
}

impl FromRequest<AdminState> for UploadedFile {
    type Rejection = Response;

    async fn from_request(req: Request, state: &AdminState) -> Result<Self, Self::Rejection> {
        // Anything that is not a multipart body simply carries no file.
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|_| AdminError::NoFile.into_response())?;

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(IntoResponse::into_response)?
        {
            if field.name() != Some(UPLOAD_FIELD) {
                continue;
            }
            let file_name = field.file_name().map(str::to_string);
            let temp = tempfile::Builder::new()
                .prefix("bizdb-upload-")
                .suffix(".xlsx")
                .tempfile_in(&state.config.upload_dir)
                .map_err(io_rejection)?;
            let mut writer = tokio::fs::File::from_std(temp.reopen().map_err(io_rejection)?);

            // Early returns drop `temp`, which deletes the partial file.
            while let Some(chunk) = field.chunk().await.map_err(IntoResponse::into_response)? {
                writer.write_all(&chunk).await.map_err(io_rejection)?;
            }
            writer.flush().await.map_err(io_rejection)?;

            debug!(path = %temp.path().display(), name = ?file_name, "upload spooled");
            return Ok(UploadedFile {
                file: temp,
                file_name,
            });
        }

        Err(AdminError::NoFile.into_response())
    }
}

fn io_rejection(e: std::io::Error) -> Response {
    AdminError::from(e).into_response()
}
