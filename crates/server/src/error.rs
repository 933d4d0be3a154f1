//! HTTP mapping for core errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scrapegate_core::Error;
use serde_json::json;

/// Wrapper that renders a core [`Error`] as an HTTP response.
///
/// Validation problems map to 400, lookup misses to 404, everything the
/// caller cannot fix (conflicts, persistence, upstream) to 500. The body is
/// a `{"error": "..."}` object carrying the original message.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidUrl(_) | Error::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_)
            | Error::UpstreamUnavailable(_)
            | Error::Database(_)
            | Error::MigrationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(err = %self.0, "request failed");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::MissingParameter("url"), StatusCode::BAD_REQUEST),
            (Error::InvalidUrl("x".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::Conflict("example.com".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::UpstreamUnavailable("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
