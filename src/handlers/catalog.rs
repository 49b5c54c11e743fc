use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::db::{Record, TableDescriptor, UnsafeIdent};
use crate::{AdminError, router::AdminState};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub tables: usize,
    pub host: String,
    pub database: String,
    pub user: String,
}

/// GET /api/status
pub async fn status(State(state): State<AdminState>) -> Result<Json<StatusResponse>, AdminError> {
    let tables = state.db.table_count().await?;
    let cfg = &state.config;
    Ok(Json(StatusResponse {
        status: "connected",
        tables,
        host: cfg.db_host.clone(),
        database: cfg.db_name.clone(),
        user: cfg.db_user.clone(),
    }))
}

/// GET /api/tables -> catalog statistics for the configured database.
pub async fn tables(
    State(state): State<AdminState>,
) -> Result<Json<Vec<TableDescriptor>>, AdminError> {
    let tables = state.db.catalog(&state.config.db_name).await?;
    Ok(Json(tables))
}

/// GET /api/table/{name} -> every row of the named table.
///
/// The path segment is used as the table identifier verbatim.
pub async fn table_rows(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Record>>, AdminError> {
    let table = UnsafeIdent::new_unchecked(name);
    let rows = state.db.select_all(&table).await?;
    Ok(Json(rows))
}
