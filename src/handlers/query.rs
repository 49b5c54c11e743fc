use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::QueryOutcome;
use crate::service::query_guard;
use crate::{AdminError, router::AdminState};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// POST /api/execute-query {query}
pub async fn execute_query(
    State(state): State<AdminState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryOutcome>, AdminError> {
    if let Err(e) = query_guard::check(&req.query) {
        warn!(query = %req.query, "refused query containing a denied keyword");
        return Err(e);
    }
    let outcome = state.db.execute(&req.query).await?;
    info!(query = %req.query, "executed ad-hoc query");
    Ok(Json(outcome))
}
