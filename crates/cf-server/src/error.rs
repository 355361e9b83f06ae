//! Error-to-HTTP response conversion.
//!
//! Handlers return `Result<T, AppError>`; the body is always
//! `{"ok": false, "error", "kind", "request_id"}` and never carries internal
//! paths (see [`cf_core::Error::public_message`]).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: cf_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: cf_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

impl From<cf_core::Error> for AppError {
    fn from(e: cf_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                request_id = self.request_id.as_deref().unwrap_or("-"),
                "Server error in API handler"
            );
        }

        let body = json!({
            "ok": false,
            "error": self.inner.public_message(),
            "kind": self.inner.kind(),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_input_is_400_with_kind() {
        let response = AppError::new(cf_core::Error::InvalidInput("bad token 'abc'".into()))
            .with_request_id("req-1")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["kind"], "invalid_input");
        assert_eq!(body["request_id"], "req-1");
        assert!(body["error"].as_str().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let response =
            AppError::new(cf_core::Error::Internal("/data/tmp/x exploded".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "internal_error");
        assert!(!body["error"].as_str().unwrap().contains("/data"));
    }

    #[test]
    fn not_found_produces_404() {
        let response = AppError::new(cf_core::Error::not_found("artifact", "x.mp4")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn fetch_failure_is_bad_gateway() {
        let response =
            AppError::new(cf_core::Error::FetchFailed("upstream 503".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
