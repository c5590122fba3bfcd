//! Device-number registry handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use simtrack_core::{RegistryFilter, RegistryRecord};

use crate::AppState;
use crate::api_error::ApiError;
use crate::api_types::{DataResponse, PagedResponse, RegistryQuery, RetireAllResponse};

pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RegistryQuery>,
) -> Result<Json<PagedResponse<RegistryRecord>>, ApiError> {
    let filter = RegistryFilter {
        sn: query.sn,
        batch_id: query.batch_id,
        status: query.status,
        active: query.active,
    };
    let page = state.registry.list(filter, query.offset, query.limit).await?;
    Ok(Json(page.into()))
}

pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<RegistryRecord>>, ApiError> {
    let record = state.registry.get(&id).await?;
    Ok(Json(DataResponse::new(record)))
}

pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<()>>, ApiError> {
    state.registry.delete(&id).await?;
    Ok(Json(DataResponse::new(())))
}

/// Retire every active number. The retired rows are flushed from the
/// provider by the next cleanup pass.
pub async fn retire_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RetireAllResponse>, ApiError> {
    let retired = state.registry.retire_all().await?;
    Ok(Json(RetireAllResponse { success: true, retired }))
}
