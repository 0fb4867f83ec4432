//! Request handlers and wire shapes.

use crate::AppState;
use crate::error::ApiError;
use crate::extract::ApiJson;
use axum::Json;
use axum::extract::State;
use pane_license::{IssueParams, LicenseError, TokenRecord};
use pane_types::{Hwid, Tier};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;

fn parse_hwid(raw: &str) -> Result<Hwid, ApiError> {
    Hwid::parse(raw).map_err(|e| ApiError::License(LicenseError::Invalid(e.to_string())))
}

/// Runs a blocking licensing call off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LicenseError> + Send + 'static,
{
    blocking_raw(f).await?.map_err(ApiError::from)
}

/// Like [`blocking`], but hands the licensing outcome back to the caller
/// instead of converting errors.
async fn blocking_raw<T, F>(f: F) -> Result<Result<T, LicenseError>, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LicenseError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|join_err| {
        error!("licensing task panicked: {join_err}");
        ApiError::Internal
    })
}

pub(crate) async fn root() -> Json<Value> {
    Json(json!({"ok": true, "service": "pane-licensing"}))
}

pub(crate) async fn healthz() -> Json<Value> {
    Json(json!({"ok": true}))
}

pub(crate) async fn version() -> Json<Value> {
    Json(json!({"ok": true, "version": env!("CARGO_PKG_VERSION")}))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivateRequest {
    key: String,
    hwid: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ActivateResponse {
    ok: bool,
    token: String,
    tier: Tier,
    max_concurrent: u32,
    download_url: String,
}

pub(crate) async fn activate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ActivateRequest>,
) -> Result<Json<ActivateResponse>, ApiError> {
    let hwid = parse_hwid(&req.hwid)?;
    let binder = state.binder.clone();
    let activated = blocking(move || binder.activate(&req.key, &hwid)).await?;
    Ok(Json(ActivateResponse {
        ok: true,
        token: activated.token,
        tier: activated.tier,
        max_concurrent: activated.max_concurrent,
        download_url: state.download_url.clone(),
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateRequest {
    token: String,
    hwid: String,
}

pub(crate) async fn validate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ValidateRequest>,
) -> Result<Json<Value>, ApiError> {
    let hwid = parse_hwid(&req.hwid)?;
    let tokens = state.tokens.clone();
    let outcome = blocking_raw(move || tokens.validate(&req.token, &hwid)).await?;
    match outcome {
        Ok(grant) => Ok(Json(json!({
            "ok": true,
            "tier": grant.tier,
            "max_concurrent": grant.max_concurrent,
            "download_url": state.download_url,
        }))),
        // The desktop client polls this endpoint; licensing outcomes ride
        // in a 200 body so it can tell them from transport failures.
        Err(
            err @ (LicenseError::TokenNotFound
            | LicenseError::TokenRevoked
            | LicenseError::TokenExpired
            | LicenseError::HwidMismatch),
        ) => Ok(Json(json!({"ok": false, "reason": err.reason()}))),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    hwid: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyResponse {
    tier: Tier,
    max_concurrent: u32,
}

pub(crate) async fn verify(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let hwid = parse_hwid(&req.hwid)?;
    let resolver = state.resolver.clone();
    let resolved = blocking(move || resolver.verify(&hwid)).await?;
    Ok(Json(VerifyResponse {
        tier: resolved.tier,
        max_concurrent: resolved.max_concurrent,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueRequest {
    tier: Tier,
    max_activations: u32,
    #[serde(default)]
    max_concurrent: Option<u32>,
    email: String,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    sale_ref: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IssueResponse {
    ok: bool,
    key: String,
    tier: Tier,
    max_activations: u32,
    max_concurrent: u32,
}

pub(crate) async fn issue(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<IssueRequest>,
) -> Result<Json<IssueResponse>, ApiError> {
    let registry = state.registry.clone();
    let issued = blocking(move || {
        let params = IssueParams {
            tier: req.tier,
            max_activations: req.max_activations,
            max_concurrent: req
                .max_concurrent
                .unwrap_or_else(|| req.tier.default_max_concurrent()),
            email: req.email,
            prefix: req.prefix,
            sale_ref: req.sale_ref,
        };
        registry.issue(&params)
    })
    .await?;
    Ok(Json(IssueResponse {
        ok: true,
        key: issued.key,
        tier: issued.tier,
        max_activations: issued.max_activations,
        max_concurrent: issued.max_concurrent,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeyRequest {
    key: String,
}

pub(crate) async fn revoke_key(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<KeyRequest>,
) -> Result<Json<Value>, ApiError> {
    let registry = state.registry.clone();
    blocking(move || registry.revoke(&req.key)).await?;
    Ok(Json(json!({"ok": true})))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenRequest {
    token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct IntrospectResponse {
    ok: bool,
    token: TokenRecord,
}

pub(crate) async fn introspect_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> Result<Json<IntrospectResponse>, ApiError> {
    let tokens = state.tokens.clone();
    let record = blocking(move || tokens.introspect(&req.token)).await?;
    Ok(Json(IntrospectResponse {
        ok: true,
        token: record,
    }))
}

pub(crate) async fn revoke_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> Result<Json<Value>, ApiError> {
    let tokens = state.tokens.clone();
    blocking(move || tokens.revoke(&req.token)).await?;
    Ok(Json(json!({"ok": true})))
}

#[derive(Debug, Deserialize)]
pub(crate) struct GrantRequest {
    hwid: String,
    tier: Tier,
    #[serde(default)]
    max_concurrent: Option<u32>,
}

pub(crate) async fn grant_tier(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GrantRequest>,
) -> Result<Json<Value>, ApiError> {
    let hwid = parse_hwid(&req.hwid)?;
    let resolver = state.resolver.clone();
    blocking(move || resolver.grant(&hwid, req.tier, req.max_concurrent)).await?;
    Ok(Json(json!({"ok": true})))
}
