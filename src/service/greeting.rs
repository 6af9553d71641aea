//! `GET /` handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::error::BackendError;
use crate::protocol::GreetingResponse;
use crate::server::AppState;

/// Handle `GET /`.
///
/// Calls the backend once and wraps its payload in the greeting. Any backend
/// failure becomes the fixed `500 {"error": "Backend is unreachable"}` reply
/// through [`BackendError`]'s `IntoResponse`.
pub async fn greeting(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GreetingResponse>, BackendError> {
    let payload = state.backend.fetch().await?;
    Ok(Json(GreetingResponse::new(payload)))
}
