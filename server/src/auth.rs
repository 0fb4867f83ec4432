//! Admin authentication: a single shared-secret bearer credential.

use crate::AppState;
use crate::error::ApiError;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

/// Gate for the `/admin` scope.
///
/// The presented bearer credential is compared in constant time. A server
/// started without a configured secret refuses every admin call.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(secret) = state.admin_secret.as_deref() else {
        return Err(ApiError::Unauthorized);
    };
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(p) if bool::from(p.as_bytes().ct_eq(secret.as_bytes())) => Ok(next.run(req).await),
        _ => Err(ApiError::Unauthorized),
    }
}
