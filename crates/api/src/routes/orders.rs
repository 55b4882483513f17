//! Order placement and history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::OrderId;
use domain::OrderView;
use serde::Serialize;
use store::CommerceStore;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::UserEmail;
use crate::routes::checkout::CartRequest;

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub id: OrderId,
}

/// POST /orders — place an order for the authenticated user.
///
/// Validation, total computation, and the atomic stock decrement all
/// happen in one pass; on any failure nothing is persisted.
#[tracing::instrument(skip(state, user, req), fields(user_email = %user.as_str()))]
pub async fn create<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: UserEmail,
    Json(req): Json<CartRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let id = state.checkout.place_order(user.as_str(), &req.items).await?;
    Ok((StatusCode::CREATED, Json(OrderCreatedResponse { id })))
}

/// GET /orders/my — the authenticated user's orders, newest first.
#[tracing::instrument(skip(state, user), fields(user_email = %user.as_str()))]
pub async fn my_orders<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: UserEmail,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let orders = state.checkout.order_history(user.as_str()).await?;
    Ok(Json(orders))
}
