//! Flow CRUD routes — metadata, draft/production views, lock toggle.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::state::AppState;
use custodia_core::Error;
use custodia_store::Flow;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/flows", get(list_flows))
        .route("/flows/refresh", get(refresh_flows))
        .route("/flow/metadata", post(upsert_flow_metadata))
        .route("/flow/metadata/{id}", get(get_flow))
        .route("/flow/draft", post(save_flow_draft))
        .route("/flow/draft/metadata", post(upsert_flow_metadata))
        .route("/flow/draft/{id}", get(get_flow))
        .route("/flow/production/{id}", get(get_flow))
        .route("/flow/{id}", delete(delete_flow))
        .route("/flow/{id}/lock/{on_off}", get(set_flow_lock))
}

async fn list_flows(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    match state.store.list_flows() {
        Ok((flows, total)) => Json(serde_json::json!({
            "total": total,
            "result": flows,
        })),
        Err(e) => Json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// The store reads its own writes; kept for client compatibility with
/// index-backed deployments that flush between write and read.
async fn refresh_flows() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn upsert_flow_metadata(
    State(state): State<Arc<AppState>>,
    Json(flow): Json<Flow>,
) -> impl IntoResponse {
    match state.store.upsert_flow_metadata(&flow) {
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

async fn save_flow_draft(
    State(state): State<Arc<AppState>>,
    Json(flow): Json<Flow>,
) -> impl IntoResponse {
    match state.store.save_flow(&flow) {
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

/// Metadata, draft, and production views all serve the stored flow
/// record; a missing flow is a 404 with a `null` body.
async fn get_flow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.load_flow(&id) {
        Ok(Some(flow)) => (
            StatusCode::OK,
            Json(serde_json::to_value(flow).unwrap_or_default()),
        ),
        Ok(None) => (StatusCode::NOT_FOUND, Json(serde_json::Value::Null)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn set_flow_lock(
    State(state): State<Arc<AppState>>,
    Path((id, on_off)): Path<(String, String)>,
) -> impl IntoResponse {
    let lock = match on_off.as_str() {
        "yes" => true,
        "no" => false,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("Invalid lock value: {}", on_off) })),
            );
        }
    };

    match state.store.set_flow_lock(&id, lock) {
        Ok(ack) => (
            StatusCode::OK,
            Json(serde_json::to_value(ack).unwrap_or_default()),
        ),
        Err(Error::NotFound(_)) => (StatusCode::NOT_FOUND, Json(serde_json::Value::Null)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn delete_flow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_flow(&id) {
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
