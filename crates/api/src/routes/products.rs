//! Catalog CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Currency, ProductId};
use serde::Deserialize;
use store::{CommerceStore, NewProduct, Product};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ProductRequest {
    pub title: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub stock: i64,
    pub slug: String,
}

impl ProductRequest {
    fn into_new_product(self) -> Result<NewProduct, ApiError> {
        if self.price_cents < 0 {
            return Err(ApiError::BadRequest(
                "price_cents must not be negative".to_string(),
            ));
        }
        if self.stock < 0 {
            return Err(ApiError::BadRequest("stock must not be negative".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(ApiError::BadRequest("title must not be empty".to_string()));
        }

        Ok(NewProduct {
            title: self.title,
            description: self.description,
            price_cents: self.price_cents,
            currency: Currency::new(self.currency),
            stock: self.stock,
            slug: self.slug,
        })
    }
}

/// GET /products — list the whole catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list_products().await?;
    Ok(Json(products))
}

/// POST /products — add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.store.insert_product(req.into_new_product()?).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products/:id — fetch a single product.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// PUT /products/:id — replace a product's attributes.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .store
        .update_product(id, req.into_new_product()?)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// DELETE /products/:id — remove a product from the catalog.
///
/// Existing orders keep their price snapshots; only the catalog entry
/// goes away.
#[tracing::instrument(skip(state))]
pub async fn remove<S: CommerceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_product(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Product {id} not found")))
    }
}
