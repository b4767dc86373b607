use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::RecommendationEngine;
use crate::store::CatalogStore;

pub mod movies;
pub mod ratings;
pub mod recommendations;

/// Shared application state: the catalog store and the recommendation
/// engine built on top of it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub engine: RecommendationEngine,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        let engine = RecommendationEngine::new(store.clone());
        Self { store, engine }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(movies::list))
        .route("/movies/:id", get(movies::get_by_id))
        .route("/ratings", post(ratings::rate_movie))
        .route(
            "/users/:user_id/recommendations",
            get(recommendations::for_user),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
