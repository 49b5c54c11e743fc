use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::config::Config;
use crate::db::Database;
use crate::handlers::{backup, catalog, chart, query, spreadsheet};
use crate::service::mysql_cli::MysqlCli;

/// State shared by every route: the one database handle, the resolved
/// configuration and the CLI bridge for dump/restore.
#[derive(Clone)]
pub struct AdminState {
    pub db: Arc<dyn Database>,
    pub config: Arc<Config>,
    pub cli: MysqlCli,
}

impl AdminState {
    pub fn new(db: Arc<dyn Database>, config: Arc<Config>) -> Self {
        let cli = MysqlCli::from_config(&config);
        Self { db, config, cli }
    }
}

pub fn admin_router(state: AdminState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = DefaultBodyLimit::max(state.config.upload_limit_bytes);

    Router::new()
        .route("/api/status", get(catalog::status))
        .route("/api/tables", get(catalog::tables))
        .route("/api/table/{name}", get(catalog::table_rows))
        .route("/api/backup", post(backup::create_backup))
        .route("/api/backup/{filename}", get(backup::download_backup))
        .route("/api/backups", get(backup::list_backups))
        .route("/api/restore", post(backup::restore_backup))
        .route("/api/reset", post(backup::reset_database))
        .route("/api/execute-query", post(query::execute_query))
        .route("/api/chart-data/{source}", get(chart::chart_data))
        .route("/api/export-excel", get(spreadsheet::export_excel))
        .route("/api/import-excel", post(spreadsheet::import_excel))
        .layer(body_limit)
        .layer(cors)
        .with_state(state)
}

fn cors_layer(cfg: &Config) -> CorsLayer {
    let origins = cfg.cors_origin_list();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| warn!(origin = %origin, error = %e, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}
