//! Provisioning and reconciliation trigger handlers.
//!
//! The reconciliation loop runs on the background poller; these endpoints
//! let an operator kick a cycle (or the retired-number cleanup) on demand
//! and read the resulting report.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use simtrack_service::{CleanupReport, CycleReport, ProvisionReport};

use crate::AppState;
use crate::api_error::ApiError;
use crate::api_types::{DataResponse, ProvisionRequest};

pub async fn provision(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProvisionRequest>,
) -> Result<Json<DataResponse<ProvisionReport>>, ApiError> {
    if body.devices.is_empty() {
        return Err(ApiError::BadRequest("devices must not be empty".to_owned()));
    }
    let report = state.provision.provision(body.devices).await;
    Ok(Json(DataResponse::new(report)))
}

/// Run one reconciliation cycle now. Returns a skipped report when the
/// background poller already has a cycle in flight.
pub async fn run_cycle(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<CycleReport>>, ApiError> {
    let report = state.reconcile.run_cycle().await?;
    Ok(Json(DataResponse::new(report)))
}

pub async fn cleanup(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<CleanupReport>>, ApiError> {
    let report = state.reconcile.cleanup_retired().await?;
    Ok(Json(DataResponse::new(report)))
}
