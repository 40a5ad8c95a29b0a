//! Consent-type catalog routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::state::AppState;
use custodia_store::ConsentType;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/consent/type", post(upsert_consent_type))
        .route(
            "/consent/type/{id}",
            get(get_consent_type).delete(delete_consent_type),
        )
        .route("/consent/types", get(list_consent_types))
}

async fn upsert_consent_type(
    State(state): State<Arc<AppState>>,
    Json(consent_type): Json<ConsentType>,
) -> impl IntoResponse {
    match state.store.save_consent_type(&consent_type) {
        Ok(ack) => (
            StatusCode::OK,
            Json(serde_json::to_value(ack).unwrap_or_default()),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn get_consent_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.load_consent_type(&id) {
        Ok(Some(consent_type)) => (
            StatusCode::OK,
            Json(serde_json::to_value(consent_type).unwrap_or_default()),
        ),
        Ok(None) => (StatusCode::NOT_FOUND, Json(serde_json::Value::Null)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn delete_consent_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_consent_type(&id) {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({ "deleted": 1, "id": id })),
        ),
        Ok(false) => (StatusCode::NOT_FOUND, Json(serde_json::Value::Null)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn list_consent_types(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    match state.store.load_all_consent_types() {
        Ok(types) => Json(serde_json::json!({
            "total": types.len(),
            "result": types,
        })),
        Err(e) => Json(serde_json::json!({ "error": e.to_string() })),
    }
}
