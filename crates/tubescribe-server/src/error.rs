//! HTTP error mapping. Every error body is `{"detail": "..."}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tubescribe_core::InvalidRequest;

use crate::auth::AuthError;

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unusable video reference; 400.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequest),
    /// Rejected credentials; 401 or 403.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Disabled or missing resource; 404.
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::MalformedHeader) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::InvalidToken) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::from(InvalidRequest::EmptyReference).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::MalformedHeader).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidToken).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn detail_uses_inner_message() {
        let err = ApiError::from(AuthError::InvalidToken);
        assert_eq!(err.to_string(), "Invalid API token");
        let err = ApiError::from(InvalidRequest::EmptyReference);
        assert_eq!(err.to_string(), "video reference is empty");
    }
}
