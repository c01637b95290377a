use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::Value;

use service::errors::ServiceError;

use service::access;
use service::storage::StorageEngine;
use service::store::domain::{Document, TokenRecord};
use service::tokens::TokenRegistry;

use crate::errors::ApiError;
use crate::routes::{ok_data, ok_message, password_header, request_host, ServerState};

/// Resolve the token and apply the domain + password gates. Shared by every
/// mutating storage and backup operation; reads use `resolve` alone.
pub(crate) async fn authorize_mutation(
    state: &ServerState,
    token: &str,
    headers: &HeaderMap,
) -> Result<TokenRecord, ApiError> {
    let registry = TokenRegistry::new(Arc::clone(&state.repo));
    let record = registry.resolve(token).await?;
    access::verify_domain(request_host(headers).as_deref(), &record.domains)?;
    access::verify_password(&record, password_header(headers).as_deref())?;
    Ok(record)
}

/// GET /:token: full document. No checks beyond token resolution.
pub async fn read_all(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let registry = TokenRegistry::new(Arc::clone(&state.repo));
    let record = registry.resolve(&token).await?;
    let engine = StorageEngine::new(Arc::clone(&state.repo));
    let data = engine.read_all(&record.connect).await?;
    Ok(ok_data(Value::Object(data)))
}

/// GET /:token/:key: single value.
pub async fn read_key(
    State(state): State<ServerState>,
    Path((token, key)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let registry = TokenRegistry::new(Arc::clone(&state.repo));
    let record = registry.resolve(&token).await?;
    let engine = StorageEngine::new(Arc::clone(&state.repo));
    let value = engine.read_key(&record.connect, &key).await?;
    Ok(ok_data(value))
}

/// POST /:token: merge-write the body fields into the document. Body
/// rejections (malformed JSON, wrong content type) are folded into the
/// failure envelope instead of axum's plain-text replies.
pub async fn write(
    State(state): State<ServerState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(incoming) = body.map_err(|r| ServiceError::InvalidInput(r.body_text()))?;
    let record = authorize_mutation(&state, &token, &headers).await?;
    let engine = StorageEngine::new(Arc::clone(&state.repo));
    engine.write(&record.connect, incoming).await?;
    Ok(ok_message("Data successfully added"))
}

/// DELETE /:token: drop the whole document.
pub async fn delete_all(
    State(state): State<ServerState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let record = authorize_mutation(&state, &token, &headers).await?;
    let engine = StorageEngine::new(Arc::clone(&state.repo));
    engine.delete_all(&record.connect).await?;
    Ok(ok_message("Storage deleted"))
}

/// DELETE /:token/:key: remove one key.
pub async fn delete_key(
    State(state): State<ServerState>,
    Path((token, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let record = authorize_mutation(&state, &token, &headers).await?;
    let engine = StorageEngine::new(Arc::clone(&state.repo));
    engine.delete_key(&record.connect, &key).await?;
    Ok(ok_message("Key deleted"))
}
