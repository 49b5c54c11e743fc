use axum::{
    Json,
    extract::{Path, State},
};

use crate::types::{ChartSeries, ChartSource};
use crate::{AdminError, router::AdminState};

/// GET /api/chart-data/{source}
pub async fn chart_data(
    State(state): State<AdminState>,
    Path(source): Path<String>,
) -> Result<Json<ChartSeries>, AdminError> {
    let source: ChartSource = source.parse()?;
    let rows = state.db.fetch_records(source.query()).await?;
    Ok(Json(ChartSeries::from_rows(source, &rows)))
}
