//! Customer-facing consent routes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use custodia_consent::{ConsentMode, ConsentReconciler};
use custodia_core::Error;
use custodia_store::{cache_key, PROFILE_INDEX};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customer/consent", post(add_customer_consent))
        .route("/customer/profile/{id}", get(get_customer_profile))
}

/// Reference to an entity by id.
#[derive(Deserialize)]
struct EntityRef {
    id: String,
}

#[derive(Deserialize)]
struct CustomerConsentPayload {
    session: EntityRef,
    profile: EntityRef,
    source: EntityRef,
    #[serde(default)]
    consents: HashMap<String, bool>,
}

#[derive(Deserialize)]
struct ConsentQuery {
    #[serde(default)]
    all: bool,
}

async fn add_customer_consent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConsentQuery>,
    Json(payload): Json<CustomerConsentPayload>,
) -> impl IntoResponse {
    // Pre-touch hot entries before the store reads
    state
        .records
        .warm(&cache_key("session", &payload.session.id));
    state
        .records
        .warm(&cache_key(PROFILE_INDEX, &payload.profile.id));

    let reconciler = ConsentReconciler::new(&state.store);
    let mode = ConsentMode::from_apply_all(query.all);

    match reconciler.reconcile(
        &payload.profile.id,
        &payload.session.id,
        &payload.source.id,
        mode,
        &payload.consents,
    ) {
        Ok(profile) => {
            // The persisted row changed; refresh the cached record
            let key = cache_key(PROFILE_INDEX, &profile.id);
            match state.store.load_profile_record(&profile.id) {
                Ok(Some(record)) => state.records.put(key, record),
                _ => state.records.invalidate(&key),
            }
            (
                StatusCode::OK,
                Json(serde_json::to_value(&profile).unwrap_or_default()),
            )
        }
        Err(Error::AccessDenied) => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "detail": "Access denied" })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn get_customer_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let key = cache_key(PROFILE_INDEX, &id);
    if let Some(record) = state.records.get(&key) {
        return (StatusCode::OK, Json(record.to_value()));
    }

    match state.store.load_profile_record(&id) {
        Ok(Some(record)) => {
            let value = record.to_value();
            state.records.put(key, record);
            (StatusCode::OK, Json(value))
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Profile not found" })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}
