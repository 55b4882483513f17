//! HTTP API server with observability for the storefront backend.
//!
//! Provides REST endpoints for the product catalog, cart validation,
//! order placement, and order history, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::CheckoutService;
use metrics_exporter_prometheus::PrometheusHandle;
use store::CommerceStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub checkout: CheckoutService<S>,
    pub store: S,
}

/// Creates the application state around a store.
pub fn create_state<S: CommerceStore + Clone>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        checkout: CheckoutService::new(store.clone()),
        store,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CommerceStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list::<S>))
        .route("/products", post(routes::products::create::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route(
            "/products/{id}",
            axum::routing::put(routes::products::update::<S>),
        )
        .route(
            "/products/{id}",
            axum::routing::delete(routes::products::remove::<S>),
        )
        .route("/checkout/validate", post(routes::checkout::validate::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/my", get(routes::orders::my_orders::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
