//! HTTP route handlers.

pub mod consent_type;
pub mod customer;
pub mod flow;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .merge(customer::routes())
        .merge(flow::routes())
        .merge(consent_type::routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthcheck(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "custodia",
        "profiles": state.store.count_profiles().unwrap_or(0),
        "flows": state.store.count_flows().unwrap_or(0),
        "consentTypes": state.store.count_consent_types().unwrap_or(0),
    }))
}
