//! API-key guard for the administration routes.
//!
//! The scrape-allowed check stays open; only custom-rule CRUD sits behind
//! this. Keys travel in the `X-API-Key` header and are compared by SHA-256
//! digest against the `api_keys` table.

use crate::state::AppState;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use scrapegate_core::store::api_keys;
use serde_json::json;

pub const API_KEY_HEADER: &str = "x-api-key";

pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(key) = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "X-API-Key header is missing" })),
        )
            .into_response();
    };

    match api_keys::status(&state.db, &api_keys::digest(key)).await {
        Ok(Some(true)) => next.run(req).await,
        Ok(Some(false)) => {
            (StatusCode::FORBIDDEN, Json(json!({ "error": "api-key is not active" }))).into_response()
        }
        Ok(None) => (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid api-key" }))).into_response(),
        Err(e) => {
            tracing::error!(err = %e, "failed to query api key");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "api-key check failed" })),
            )
                .into_response()
        }
    }
}
