//! Bearer token check for the transcription endpoint.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use tubescribe_telemetry::metrics::AUTH_REJECTIONS_TOTAL;

use crate::error::ApiError;

/// Shared secret expected in `Authorization: Bearer <token>`.
pub struct ApiToken(SecretString);

impl ApiToken {
    /// Token compared against every `/transcribe` request.
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Check a raw `Authorization` header value.
    pub fn verify(&self, header: Option<&str>) -> Result<(), AuthError> {
        let presented = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AuthError::MalformedHeader)?;
        let presented = presented.trim();
        if constant_time_eq(presented.as_bytes(), self.0.expose_secret().as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken([REDACTED])")
    }
}

/// Rejected credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Missing header or a scheme other than `Bearer`.
    #[error("Invalid authorization header")]
    MalformedHeader,
    /// Well-formed header carrying the wrong token.
    #[error("Invalid API token")]
    InvalidToken,
}

impl AuthError {
    fn kind(self) -> &'static str {
        match self {
            Self::MalformedHeader => "malformed_header",
            Self::InvalidToken => "invalid_token",
        }
    }
}

/// Constant-time comparison for auth validation.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware: reject the request unless it carries the configured token.
pub async fn require_bearer(
    State(token): State<Arc<ApiToken>>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    match token.verify(header) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            metrics::counter!(AUTH_REJECTIONS_TOTAL, "reason" => e.kind()).increment(1);
            debug!(reason = e.kind(), "rejected request");
            ApiError::from(e).into_response()
        }
    }
}
