//! Request handlers for the scrape-allowed check and custom-rule CRUD.
//!
//! Wire contract follows the original service: the permission check speaks
//! plain text ("true"/"false"), administration speaks JSON, rule bodies
//! travel as the raw request body with the target URL in a query parameter.

use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use scrapegate_core::{Error, Rule, domain};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ScrapeAllowedParams {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user_agent: String,
}

/// `GET /robots/scrape-allowed?url=..&user_agent=..` → "true" | "false".
pub async fn scrape_allowed(State(state): State<AppState>, Query(params): Query<ScrapeAllowedParams>) -> Response {
    match state.resolver.is_allowed(&params.url, &params.user_agent).await {
        Ok(true) => (StatusCode::OK, "true").into_response(),
        Ok(false) => (StatusCode::OK, "false").into_response(),
        Err(e @ (Error::MissingParameter(_) | Error::InvalidUrl(_))) => {
            (StatusCode::BAD_REQUEST, format!("error: {e}")).into_response()
        }
        Err(e) => {
            tracing::error!(err = %e, "scrape-allowed check failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("error: {e}")).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GetRuleParams {
    pub id: Option<i64>,
    pub url: Option<String>,
}

/// `GET /robots/custom-rule?id=..` or `?url=..` → rule object.
///
/// `id` wins when both are given.
pub async fn get_rule(State(state): State<AppState>, Query(params): Query<GetRuleParams>) -> Response {
    let result = match (params.id, params.url.as_deref()) {
        (Some(id), _) => state.store.get_by_id(id).await,
        (None, Some(url)) if !url.is_empty() => state.store.get_by_url(url).await,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "'id' or 'url' query parameter is required" })),
            )
                .into_response();
        }
    };

    match result {
        Ok(rule) => Json(rule).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRuleParams {
    #[serde(default)]
    pub url: String,
}

/// `POST /robots/custom-rule?url=..` with the ruleset as raw body → `{"id": n}`.
pub async fn create_rule(
    State(state): State<AppState>, Query(params): Query<CreateRuleParams>, body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    if params.url.is_empty() {
        return Err(Error::MissingParameter("url").into());
    }
    if body.is_empty() {
        return Err(Error::MissingParameter("file").into());
    }

    let domain = domain::host_of(&params.url)?;
    let id = state.store.create(&domain, &body).await?;
    tracing::info!(id, domain = %domain, "custom rule created");

    Ok(Json(json!({ "id": id })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRuleParams {
    pub id: Option<i64>,
    #[serde(default)]
    pub url: String,
}

/// `PUT /robots/custom-rule?id=..&url=..` with the ruleset as raw body → rule object.
///
/// All-or-nothing: an unparseable replacement URL rejects the whole update,
/// nothing is written.
pub async fn update_rule(
    State(state): State<AppState>, Query(params): Query<UpdateRuleParams>, body: String,
) -> Result<Json<Rule>, ApiError> {
    let Some(id) = params.id else {
        return Err(Error::MissingParameter("id").into());
    };
    if params.url.is_empty() {
        return Err(Error::MissingParameter("url").into());
    }
    if body.is_empty() {
        return Err(Error::MissingParameter("file").into());
    }

    let domain = domain::host_of(&params.url)?;
    let rule = state.store.update(id, &domain, &body).await?;
    tracing::info!(id, domain = %domain, "custom rule updated");

    Ok(Json(rule))
}

#[derive(Debug, Deserialize)]
pub struct DeleteRuleParams {
    pub id: Option<i64>,
}

/// `DELETE /robots/custom-rule?id=..` → confirmation message. Idempotent.
pub async fn delete_rule(
    State(state): State<AppState>, Query(params): Query<DeleteRuleParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(id) = params.id else {
        return Err(Error::MissingParameter("id").into());
    };

    state.store.delete(id).await?;

    Ok(Json(json!({ "message": format!("rule with id '{id}' is deleted") })))
}

/// `GET /ping` liveness probe.
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "message": "pong" }))
}

/// Catch-all for unknown routes.
pub async fn not_found(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("no route found for {method} {uri}") })),
    )
        .into_response()
}
