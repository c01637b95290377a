use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::errors::ServiceError;
use tracing::error;

/// Core failure rendered through the uniform envelope. The external status is
/// deliberately a flat 500 for all core error kinds; the precise kind (and
/// its stable code) is preserved here and logged.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self { Self(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(code = self.0.code(), error = %self.0, "request_failed");
        let body = serde_json::json!({ "status": false, "description": self.0.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
