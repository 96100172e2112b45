//! Site-wide API endpoints
//!
//! - GET /api/v1/stats - Record counts shown on the dashboard

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState};
use crate::services::Stats;

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<Stats>, ApiError> {
    let stats = state.dashboard_service.stats().await?;
    Ok(Json(stats))
}
