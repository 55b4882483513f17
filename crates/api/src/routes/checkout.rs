//! Cart validation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::CartLine;
use serde::Deserialize;
use store::CommerceStore;

use crate::AppState;
use crate::error::ApiError;

/// A cart as submitted by the client.
#[derive(Deserialize)]
pub struct CartRequest {
    pub items: Vec<CartLine>,
}

/// POST /checkout/validate — check a cart against current inventory.
///
/// Returns `{"ok": true}` when every line can be fulfilled; otherwise
/// responds 400 with the full list of problems so the client can show
/// them all at once.
#[tracing::instrument(skip(state, req), fields(lines = req.items.len()))]
pub async fn validate<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CartRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let issues = state.checkout.preview_cart(&req.items).await?;

    if issues.is_empty() {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(ApiError::CartInvalid(issues))
    }
}
