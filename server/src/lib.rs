//! HTTP API for the Pane licensing server.
//!
//! The router composes the licensing components behind a small JSON
//! surface: public activation/validation/verification for the desktop
//! client, and a bearer-secret-gated `/admin` scope for key issuance,
//! revocation, and token diagnostics.

mod auth;
mod error;
mod extract;
mod routes;

pub use error::{ApiError, Failure};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use pane_license::{ActivationBinder, KeyRegistry, TierResolver, TokenStore};
use std::sync::Arc;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    /// Key registry component.
    pub registry: Arc<KeyRegistry>,
    /// Activation binder component.
    pub binder: Arc<ActivationBinder>,
    /// Token store component.
    pub tokens: Arc<TokenStore>,
    /// Tier resolver component.
    pub resolver: Arc<TierResolver>,
    /// Shared admin secret; `None` disables the `/admin` scope entirely.
    pub admin_secret: Option<String>,
    /// Download URL echoed with successful activations and validations.
    pub download_url: String,
}

/// Build the HTTP API router over the given state.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/license/issue", post(routes::issue))
        .route("/license/revoke", post(routes::revoke_key))
        .route("/token/introspect", post(routes::introspect_token))
        .route("/token/revoke", post(routes::revoke_token))
        .route("/tier/grant", post(routes::grant_tier))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/", get(routes::root))
        .route("/healthz", get(routes::healthz))
        .route("/version", get(routes::version))
        .route("/license/activate", post(routes::activate))
        .route("/license/validate", post(routes::validate))
        .route("/verify", post(routes::verify))
        .nest("/admin", admin)
        .with_state(state)
}
