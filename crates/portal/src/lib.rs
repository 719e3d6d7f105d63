//! Field Orders Portal library.
//!
//! This crate provides the portal functionality as a library, allowing the
//! router to be tested end to end and the services to be reused by the CLI.
//!
//! # Architecture
//!
//! - Axum web framework with Askama templates for server-side rendering
//! - Reference data (distributors, products, users, employee mapping) read
//!   from local CSV files and replaced through the admin panel
//! - Orders recorded in a Google spreadsheet, photos uploaded to Google Drive
//! - In-memory cookie sessions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod google;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use state::AppState;

/// Directory holding the stylesheet.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the portal router with every layer except Sentry.
///
/// The Sentry layers are added by the binary so tests can run without a
/// Sentry hub.
pub fn build_app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let max_upload_bytes = state.config().max_upload_bytes;

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use field_orders_core::{LedgerRow, PhotoKind};
    use tower::ServiceExt;

    use super::*;
    use crate::config::PortalConfig;
    use crate::services::{FileStore, FileStoreError, LedgerBackend, LedgerError};

    struct NullLedger;

    #[async_trait]
    impl LedgerBackend for NullLedger {
        async fn append_rows(&self, _rows: &[LedgerRow]) -> Result<(), LedgerError> {
            Ok(())
        }
    }

    struct NullFiles;

    #[async_trait]
    impl FileStore for NullFiles {
        async fn upload(
            &self,
            _filename: &str,
            _kind: PhotoKind,
            _bytes: &[u8],
        ) -> Result<String, FileStoreError> {
            Ok(String::new())
        }
    }

    fn app(dir: &tempfile::TempDir) -> Router {
        let state = AppState::with_backends(
            PortalConfig::rooted_at(dir.path()),
            Arc::new(NullLedger),
            Arc::new(NullFiles),
        )
        .unwrap();
        build_app(state)
    }

    #[tokio::test]
    async fn test_health_and_readiness() {
        let dir = tempfile::tempdir().unwrap();

        let response = app(&dir)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(&dir)
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_anonymous_root_redirects_to_login() {
        let dir = tempfile::tempdir().unwrap();

        let response = app(&dir)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login"
        );
    }

    #[tokio::test]
    async fn test_responses_carry_security_headers_and_request_id() {
        let dir = tempfile::tempdir().unwrap();

        let response = app(&dir)
            .oneshot(
                Request::get("/auth/login")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
        assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(response.headers().contains_key(header::X_CONTENT_TYPE_OPTIONS));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PortalConfig::rooted_at(dir.path());
        config.max_upload_bytes = 16;
        let state =
            AppState::with_backends(config, Arc::new(NullLedger), Arc::new(NullFiles)).unwrap();

        let response = build_app(state)
            .oneshot(
                Request::post("/auth/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header(header::CONTENT_LENGTH, "64")
                    .body(Body::from("username=admin&password=".to_string() + &"x".repeat(40)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
