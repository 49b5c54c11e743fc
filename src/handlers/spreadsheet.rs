use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{info, warn};

use crate::db::UnsafeIdent;
use crate::middleware::UploadedFile;
use crate::service::batch::settle_all;
use crate::service::workbook::{self, EXPORT_TABLES, SheetData, XLSX_CONTENT_TYPE};
use crate::{AdminError, router::AdminState};

const EXPORT_DISPOSITION: &str = "attachment; filename=database_export.xlsx";

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: &'static str,
}

/// GET /api/export-excel -> one sheet per fixed table.
pub async fn export_excel(State(state): State<AdminState>) -> Result<Response, AdminError> {
    let tables: Vec<(&str, UnsafeIdent)> = EXPORT_TABLES
        .iter()
        .map(|(sheet, table)| (*sheet, UnsafeIdent::new_unchecked(*table)))
        .collect();

    let db = state.db.as_ref();
    let reads = tables.iter().map(move |(sheet, table)| async move {
        let rows = db.select_all(table).await?;
        Ok::<_, AdminError>(SheetData {
            name: sheet.to_string(),
            rows,
        })
    });
    let sheets = settle_all(reads)
        .await
        .map_err(|e| AdminError::ExportFailed(format!("reading tables: {e}")))?;

    let bytes = workbook::write_workbook(&sheets)
        .map_err(|e| AdminError::ExportFailed(format!("writing workbook: {e}")))?;
    info!(sheets = sheets.len(), bytes = bytes.len(), "workbook exported");

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, EXPORT_DISPOSITION),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/import-excel (multipart field `file`)
///
/// Every data row of every sheet becomes one independent insert into the table
/// named like the sheet. All inserts run to completion; one failure fails the
/// request, and rows already inserted stay in place.
pub async fn import_excel(
    State(state): State<AdminState>,
    upload: UploadedFile,
) -> Result<Json<ImportResponse>, AdminError> {
    let result = import_file(&state, &upload).await;
    upload.remove();
    result?;
    Ok(Json(ImportResponse {
        message: "Import successful",
    }))
}

async fn import_file(state: &AdminState, upload: &UploadedFile) -> Result<(), AdminError> {
    let path = upload.path().to_path_buf();
    let sheets = tokio::task::spawn_blocking(move || workbook::read_workbook(&path))
        .await
        .map_err(|e| AdminError::ImportFailed(format!("reader task: {e}")))?
        .map_err(|e| {
            warn!(file = ?upload.file_name, error = %e, "error reading Excel file");
            AdminError::ImportFailed(e.to_string())
        })?;

    let tables: Vec<UnsafeIdent> = sheets.iter().map(SheetData::table).collect();
    let mut inserts = Vec::new();
    for (sheet, table) in sheets.iter().zip(&tables) {
        for row in &sheet.rows {
            inserts.push(state.db.insert(table, row));
        }
    }

    let inserted = settle_all(inserts)
        .await
        .map_err(|e| AdminError::ImportFailed(format!("inserting rows: {e}")))?;
    info!(sheets = sheets.len(), rows = inserted.len(), "workbook imported");
    Ok(())
}
