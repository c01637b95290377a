use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::Value;

use service::restore::RestoreEngine;

use crate::errors::ApiError;
use crate::routes::storage::authorize_mutation;
use crate::routes::{ok_data, ok_message, ServerState};

/// GET /backup/:token: snapshot dates for this identity, ascending. The
/// backup-enabled gate lives in the restore engine.
pub async fn list(
    State(state): State<ServerState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let record = authorize_mutation(&state, &token, &headers).await?;
    let engine = RestoreEngine::new(Arc::clone(&state.repo));
    let dates = engine.list_backups(&record).await?;
    Ok(ok_data(dates))
}

/// POST /backup/restore/:token/:date: overwrite the live document with the
/// snapshot identified by its date.
pub async fn restore(
    State(state): State<ServerState>,
    Path((token, date)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let record = authorize_mutation(&state, &token, &headers).await?;
    let engine = RestoreEngine::new(Arc::clone(&state.repo));
    engine.restore(&record, date).await?;
    Ok(ok_message("Storage restored"))
}
