//! Catalog: read-only item listing and detail lookup.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Item;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

pub async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Item>>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let (items, total) = state.items.list(page).await?;
    Ok(Json(PaginatedResponse { data: items, total, page }))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Item>, AppError> {
    state
        .items
        .find_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Item not found"))
}
