use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::store::repository::StorageRepository;

pub mod backup;
pub mod storage;
pub mod tokens;

/// Shared handler state: the document store behind the repository trait, so
/// tests can run the full router against the in-memory mock.
#[derive(Clone)]
pub struct ServerState {
    pub repo: Arc<dyn StorageRepository>,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "status": false, "description": "Not found" })))
}

pub(crate) fn ok_data<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({ "status": true, "data": data }))
}

pub(crate) fn ok_message(message: &str) -> Json<serde_json::Value> {
    Json(json!({ "status": true, "message": message }))
}

fn host_from_url(value: &str) -> Option<String> {
    let rest = value.split("://").nth(1).unwrap_or(value);
    let host = rest.split('/').next()?.split(':').next()?;
    if host.is_empty() { None } else { Some(host.to_string()) }
}

/// Requesting caller's host: `Origin` first, then `Referer`, then `Host`.
/// Feeds the domain gate and the `domains: true` creation shorthand.
pub(crate) fn request_host(headers: &HeaderMap) -> Option<String> {
    for name in [header::ORIGIN, header::REFERER] {
        if let Some(value) = headers.get(&name).and_then(|v| v.to_str().ok()) {
            if let Some(host) = host_from_url(value) {
                return Some(host);
            }
        }
    }
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .and_then(host_from_url)
}

pub(crate) fn password_header(headers: &HeaderMap) -> Option<String> {
    headers.get("password").and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}

/// Build the full application router. Static segments (`/create`, `/refresh`,
/// `/backup`, `/health`) take priority over the token capture routes.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/create", post(tokens::create))
        .route("/refresh/:token", post(tokens::refresh))
        .route("/backup/:token", get(backup::list))
        .route("/backup/restore/:token/:date", post(backup::restore))
        .route(
            "/:token",
            get(storage::read_all).post(storage::write).delete(storage::delete_all),
        )
        .route("/:token/:key", get(storage::read_key).delete(storage::delete_key))
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_extraction_handles_scheme_port_and_path() {
        assert_eq!(host_from_url("https://example.com"), Some("example.com".into()));
        assert_eq!(host_from_url("http://example.com:8080/path"), Some("example.com".into()));
        assert_eq!(host_from_url("example.com:3000"), Some("example.com".into()));
        assert_eq!(host_from_url(""), None);
    }

    #[test]
    fn origin_wins_over_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, "https://origin.io".parse().unwrap());
        headers.insert(header::HOST, "proxy.local:80".parse().unwrap());
        assert_eq!(request_host(&headers), Some("origin.io".into()));

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "proxy.local:80".parse().unwrap());
        assert_eq!(request_host(&headers), Some("proxy.local".into()));
    }
}
