use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use service::errors::ServiceError;
use service::store::domain::CreateTokenInput;
use service::tokens::TokenRegistry;

use crate::errors::ApiError;
use crate::routes::{ok_data, request_host, ServerState};

/// Optional-body extraction: no JSON content type means no body (fall back to
/// the default), while a body that claims to be JSON but fails to parse is an
/// input error rendered through the failure envelope.
fn optional_body<T: Default>(body: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    match body {
        Ok(Json(input)) => Ok(input),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(ServiceError::InvalidInput(rejection.body_text())),
    }
}

/// POST /create: issue a fresh identity. The body is optional; `domains`
/// accepts a single domain, a list, or `true` for the caller's own host.
pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Result<Json<CreateTokenInput>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let input = optional_body(body)?;
    let host = request_host(&headers);
    let registry = TokenRegistry::new(Arc::clone(&state.repo));
    let issued = registry.issue(input, host.as_deref()).await?;
    Ok(ok_data(issued))
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshInput {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// POST /refresh/:token: rotate the bearer token, gated on the refresh token.
pub async fn refresh(
    State(state): State<ServerState>,
    Path(token): Path<String>,
    body: Result<Json<RefreshInput>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let presented = optional_body(body)?.refresh_token;
    let registry = TokenRegistry::new(Arc::clone(&state.repo));
    let new_token = registry.rotate(&token, presented.as_deref()).await?;
    Ok(ok_data(json!({ "token": new_token })))
}
