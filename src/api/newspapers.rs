//! Newspaper API endpoints
//!
//! - GET /api/v1/newspapers?page=&page_size= - Paginated newspapers, newest first
//! - GET /api/v1/newspapers/{id} - One newspaper with content, topics and publishers

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::common::{parse_id, PaginationQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{NewspaperResponse, PaginatedNewspapersResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_newspapers))
        .route("/{id}", get(get_newspaper))
}

async fn list_newspapers(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedNewspapersResponse>, ApiError> {
    let result = state.newspaper_service.list(&query.params()).await?;
    Ok(Json(result.into()))
}

async fn get_newspaper(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NewspaperResponse>, ApiError> {
    let id = parse_id(&id, "Newspaper")?;
    let newspaper = state.newspaper_service.get(id).await?;
    Ok(Json(newspaper.into()))
}
