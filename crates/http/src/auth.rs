//! Bearer-token auth middleware.
//!
//! Token auth applies to the `/api` surface when a token is configured;
//! an unset token leaves the API open for local deployments.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::api_error::ApiError;
use crate::AppState;

pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(ref expected) = state.api_token else {
        return Ok(next.run(request).await);
    };

    let authorized = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected);

    if authorized {
        Ok(next.run(request).await)
    } else {
        Err(ApiError::Unauthorized)
    }
}
