use thiserror::Error;

/// Core errors. The HTTP layer renders all of them through one failure
/// envelope, but the kind is kept precise so callers and tests can branch on
/// it instead of matching message text.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("repository error: {0}")]
    Repository(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(entity.to_string()) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 1001,
            ServiceError::Unauthorized(_) => 1002,
            ServiceError::Forbidden(_) => 1003,
            ServiceError::InvalidInput(_) => 1004,
            ServiceError::Repository(_) => 1200,
            ServiceError::Internal(_) => 1201,
        }
    }
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        ServiceError::Repository(e.to_string())
    }
}
