//! Service-history CRUD handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use simtrack_core::HistoryRecord;

use crate::api_error::ApiError;
use crate::api_types::{
    CreateHistoryRequest, DataResponse, ListQuery, PagedResponse, UpdateHistoryRequest,
};
use crate::AppState;

pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PagedResponse<HistoryRecord>>, ApiError> {
    let page = if query.unresolved {
        let items = state.history.unresolved(query.limit).await?;
        let total = items.len() as u64;
        simtrack_storage::Page { items, total, offset: 0, limit: query.limit }
    } else {
        state.history.list(query.offset, query.limit).await?
    };
    Ok(Json(page.into()))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<HistoryRecord>>, ApiError> {
    let record = state.history.get(&id).await?;
    Ok(Json(DataResponse::new(record)))
}

pub async fn create_history(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateHistoryRequest>,
) -> Result<(StatusCode, Json<DataResponse<HistoryRecord>>), ApiError> {
    let record = state.history.create(body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

pub async fn update_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateHistoryRequest>,
) -> Result<Json<DataResponse<HistoryRecord>>, ApiError> {
    let record = state.history.update(&id, body).await?;
    Ok(Json(DataResponse::new(record)))
}

pub async fn delete_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<()>>, ApiError> {
    state.history.delete(&id).await?;
    Ok(Json(DataResponse::new(())))
}
