//! Router assembly and HTTP-layer middleware.

use crate::auth;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::http::{HeaderName, Method, header};
use axum::middleware;
use axum::routing::get;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// The permission check and the liveness probe are open; custom-rule CRUD
/// sits behind the API-key guard. `max_body_mb` bounds rule uploads.
pub fn router(state: AppState, max_body_mb: usize) -> Router {
    let admin = Router::new()
        .route(
            "/custom-rule",
            get(handlers::get_rule)
                .post(handlers::create_rule)
                .put(handlers::update_rule)
                .delete(handlers::delete_rule),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_api_key));

    let robots = Router::new()
        .route("/scrape-allowed", get(handlers::scrape_allowed))
        .merge(admin);

    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/robots", robots)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .layer(RequestBodyLimitLayer::new(max_body_mb * 1024 * 1024))
        .with_state(state)
}

fn cors() -> CorsLayer {
    // allow all origins but echo the caller back, so credentials keep working
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT_ENCODING,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use bytes::Bytes;
    use http_body_util::BodyExt;
    use scrapegate_client::{Fetcher, Resolver};
    use scrapegate_core::store::api_keys;
    use scrapegate_core::{Db, Error, SqliteRobotsCache, SqliteRuleStore};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const API_KEY: &str = "test-key";
    const INACTIVE_KEY: &str = "retired-key";

    /// Fetcher double: serves a fixed live robots.txt, or fails when empty.
    struct StubFetcher(&'static str);

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, origin: &str) -> Result<Bytes, Error> {
            if self.0.is_empty() {
                Err(Error::UpstreamUnavailable(format!("status 404 from {origin}/robots.txt")))
            } else {
                Ok(Bytes::from_static(self.0.as_bytes()))
            }
        }
    }

    async fn app(live_robots: &'static str) -> Router {
        let db = Db::open_in_memory().await.unwrap();
        api_keys::insert(&db, &api_keys::digest(API_KEY), Some("test"), true)
            .await
            .unwrap();
        api_keys::insert(&db, &api_keys::digest(INACTIVE_KEY), None, false)
            .await
            .unwrap();

        let store = Arc::new(SqliteRuleStore::new(db.clone()));
        let cache = Arc::new(SqliteRobotsCache::new(db.clone(), Duration::from_secs(60)));
        let resolver = Resolver::new(store.clone(), cache, Arc::new(StubFetcher(live_robots)));

        router(AppState { db, store, resolver }, 1)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn admin_req(method: &str, uri: &str, key: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-api-key", key)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let response = app("").await.oneshot(get_req("/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("pong"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app("").await.oneshot(get_req("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("no route found"));
    }

    #[tokio::test]
    async fn test_scrape_allowed_missing_url() {
        let response = app("")
            .await
            .oneshot(get_req("/robots/scrape-allowed?user_agent=bot"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("'url'"));
    }

    #[tokio::test]
    async fn test_scrape_allowed_missing_user_agent() {
        let response = app("")
            .await
            .oneshot(get_req("/robots/scrape-allowed?url=https%3A%2F%2Fexample.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("'user_agent'"));
    }

    #[tokio::test]
    async fn test_scrape_allowed_from_live_file() {
        let app = app("User-agent: *\nDisallow: /test").await;

        let denied = app
            .clone()
            .oneshot(get_req(
                "/robots/scrape-allowed?url=https%3A%2F%2Fexample.com%2Ftest&user_agent=bot",
            ))
            .await
            .unwrap();
        assert_eq!(body_string(denied).await, "false");

        let allowed = app
            .oneshot(get_req(
                "/robots/scrape-allowed?url=https%3A%2F%2Fexample.com%2Fother&user_agent=bot",
            ))
            .await
            .unwrap();
        assert_eq!(body_string(allowed).await, "true");
    }

    #[tokio::test]
    async fn test_scrape_allowed_upstream_down() {
        let response = app("")
            .await
            .oneshot(get_req(
                "/robots/scrape-allowed?url=https%3A%2F%2Fexample.com&user_agent=bot",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("failed to load robots.txt"));
    }

    #[tokio::test]
    async fn test_override_beats_live_file() {
        // live file allows /test, operator override disallows it
        let app = app("User-agent: *\nAllow: /test").await;

        let created = app
            .clone()
            .oneshot(admin_req(
                "POST",
                "/robots/custom-rule?url=https%3A%2F%2Fexample.com",
                API_KEY,
                "User-agent: *\nDisallow: /test",
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::OK);

        let response = app
            .oneshot(get_req(
                "/robots/scrape-allowed?url=https%3A%2F%2Fexample.com%2Ftest&user_agent=bot",
            ))
            .await
            .unwrap();
        assert_eq!(body_string(response).await, "false");
    }

    #[tokio::test]
    async fn test_admin_requires_api_key() {
        let response = app("")
            .await
            .oneshot(get_req("/robots/custom-rule?id=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("X-API-Key header is missing"));
    }

    #[tokio::test]
    async fn test_admin_rejects_unknown_key() {
        let response = app("")
            .await
            .oneshot(admin_req("GET", "/robots/custom-rule?id=1", "wrong-key", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("invalid api-key"));
    }

    #[tokio::test]
    async fn test_admin_rejects_inactive_key() {
        let response = app("")
            .await
            .oneshot(admin_req("GET", "/robots/custom-rule?id=1", INACTIVE_KEY, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(body_string(response).await.contains("not active"));
    }

    #[tokio::test]
    async fn test_rule_crud_roundtrip() {
        let app = app("").await;

        let created = app
            .clone()
            .oneshot(admin_req(
                "POST",
                "/robots/custom-rule?url=https%3A%2F%2Fexample.com%2Fignored-path",
                API_KEY,
                "Disallow: /",
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::OK);
        let created_body = body_string(created).await;
        assert!(created_body.contains("\"id\""));

        let fetched = app
            .clone()
            .oneshot(admin_req(
                "GET",
                "/robots/custom-rule?url=https%3A%2F%2Fexample.com",
                API_KEY,
                "",
            ))
            .await
            .unwrap();
        assert_eq!(fetched.status(), StatusCode::OK);
        let fetched_body = body_string(fetched).await;
        assert!(fetched_body.contains("\"domain\":\"example.com\""));

        let updated = app
            .clone()
            .oneshot(admin_req(
                "PUT",
                "/robots/custom-rule?id=1&url=https%3A%2F%2Fother.com",
                API_KEY,
                "Disallow: /new",
            ))
            .await
            .unwrap();
        assert_eq!(updated.status(), StatusCode::OK);
        let updated_body = body_string(updated).await;
        assert!(updated_body.contains("\"domain\":\"other.com\""));
        assert!(updated_body.contains("Disallow: /new"));

        // idempotent delete: both calls succeed
        for _ in 0..2 {
            let deleted = app
                .clone()
                .oneshot(admin_req("DELETE", "/robots/custom-rule?id=1", API_KEY, ""))
                .await
                .unwrap();
            assert_eq!(deleted.status(), StatusCode::OK);
            assert!(body_string(deleted).await.contains("is deleted"));
        }
    }

    #[tokio::test]
    async fn test_create_duplicate_domain() {
        let app = app("").await;
        let uri = "/robots/custom-rule?url=https%3A%2F%2Fexample.com";

        let first = app
            .clone()
            .oneshot(admin_req("POST", uri, API_KEY, "Disallow: /a"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .clone()
            .oneshot(admin_req("POST", uri, API_KEY, "Disallow: /b"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(second).await.contains("already exists"));
    }

    #[tokio::test]
    async fn test_create_empty_body() {
        let response = app("")
            .await
            .oneshot(admin_req(
                "POST",
                "/robots/custom-rule?url=https%3A%2F%2Fexample.com",
                API_KEY,
                "",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_rule_requires_id_or_url() {
        let response = app("")
            .await
            .oneshot(admin_req("GET", "/robots/custom-rule", API_KEY, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("'id' or 'url'"));
    }

    #[tokio::test]
    async fn test_get_rule_missing() {
        let response = app("")
            .await
            .oneshot(admin_req("GET", "/robots/custom-rule?id=99", API_KEY, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_missing_rule() {
        let response = app("")
            .await
            .oneshot(admin_req(
                "PUT",
                "/robots/custom-rule?id=99&url=https%3A%2F%2Fexample.com",
                API_KEY,
                "Disallow: /",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_invalid_url_rejects_whole_update() {
        let app = app("").await;

        app.clone()
            .oneshot(admin_req(
                "POST",
                "/robots/custom-rule?url=https%3A%2F%2Fexample.com",
                API_KEY,
                "Disallow: /old",
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(admin_req(
                "PUT",
                "/robots/custom-rule?id=1&url=not-a-url",
                API_KEY,
                "Disallow: /new",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // nothing was written
        let fetched = app
            .oneshot(admin_req("GET", "/robots/custom-rule?id=1", API_KEY, ""))
            .await
            .unwrap();
        assert!(body_string(fetched).await.contains("Disallow: /old"));
    }
}
