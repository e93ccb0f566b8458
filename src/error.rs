//! Error types for the fetch cache
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Upstream Error Enum ==
/// Failure reported by an external collaborator (market data or text generation).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// The collaborator gave up waiting for the provider
    #[error("Upstream timed out after {0:?}")]
    Timeout(Duration),

    /// The provider rejected the request
    #[error("Upstream rejected input: {0}")]
    InvalidInput(String),

    /// Any other provider-side failure
    #[error("Upstream provider error: {0}")]
    Provider(String),

    /// The provider answered but returned nothing usable
    #[error("Upstream returned an empty response")]
    EmptyResponse,
}

impl UpstreamError {
    /// Returns true when retrying the same request could plausibly succeed.
    ///
    /// Informational only: the commentary fallback treats every variant the same.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpstreamError::Timeout(_) | UpstreamError::Provider(_) | UpstreamError::EmptyResponse
        )
    }
}

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The injected fetch function failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Storage engine failure (fatal, never recovered locally)
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A fetched value could not be encoded for storage
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Filesystem failure while opening the store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::Storage(_) | CacheError::Encode(_) | CacheError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
