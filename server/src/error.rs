//! Maps licensing errors onto HTTP responses with stable reason codes.
//!
//! Every failure body is `{"ok": false, "reason": "<code>"}`. Internal
//! faults are logged and collapsed to `internal_error`; nothing about the
//! underlying store ever reaches a client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pane_license::LicenseError;
use serde::Serialize;
use tracing::error;

/// Body shape of every failure response.
#[derive(Debug, Serialize)]
pub struct Failure {
    /// Always `false`.
    pub ok: bool,
    /// Stable machine-readable reason code.
    pub reason: &'static str,
}

/// Error as it leaves a handler.
#[derive(Debug)]
pub enum ApiError {
    /// Admin-secret mismatch, distinct from any licensing reason.
    Unauthorized,
    /// Malformed request body.
    BadRequest,
    /// A licensing failure carrying its reason code.
    License(LicenseError),
    /// Unexpected fault; details stay in the server log.
    Internal,
}

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        Self::License(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::BadRequest => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            Self::License(err) => {
                let status = license_status(&err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!("internal licensing fault: {err}");
                }
                (status, err.reason())
            }
        };
        (status, Json(Failure { ok: false, reason })).into_response()
    }
}

fn license_status(err: &LicenseError) -> StatusCode {
    match err {
        LicenseError::LicenseNotFound | LicenseError::TokenNotFound => StatusCode::NOT_FOUND,
        LicenseError::LicenseRevoked | LicenseError::ActivationLimitExceeded { .. } => {
            StatusCode::FORBIDDEN
        }
        LicenseError::TokenRevoked | LicenseError::TokenExpired | LicenseError::HwidMismatch => {
            StatusCode::UNAUTHORIZED
        }
        LicenseError::Invalid(_) => StatusCode::BAD_REQUEST,
        LicenseError::DuplicateKey | LicenseError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        LicenseError::Store(_) if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        LicenseError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
