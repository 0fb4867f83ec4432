//! Shared helpers for API tests.

#![allow(dead_code)]

use pane_db::Db;
use pane_license::{
    ActivationBinder, KeyRegistry, ManualClock, SharedClock, TierResolver, TokenStore,
};
use pane_server::{AppState, build_router};
use std::sync::Arc;

pub const T0: i64 = 1_750_000_000;
pub const TTL_DAYS: u32 = 90;
pub const TTL_SECS: i64 = TTL_DAYS as i64 * 86_400;
pub const ADMIN_SECRET: &str = "test-admin-secret";
pub const DOWNLOAD_URL: &str = "https://downloads.test/pane-pro";

pub struct TestServer {
    pub base: String,
    pub clock: Arc<ManualClock>,
}

/// Spin up the HTTP server on an OS-assigned port with the standard
/// admin secret.
pub async fn spawn_test_server() -> TestServer {
    spawn_with_secret(Some(ADMIN_SECRET.to_string())).await
}

/// Spin up the HTTP server with an explicit (or absent) admin secret.
pub async fn spawn_with_secret(admin_secret: Option<String>) -> TestServer {
    let db = Arc::new(Db::open_in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(T0));
    let shared: SharedClock = clock.clone();

    let registry = Arc::new(KeyRegistry::new(db.clone(), shared.clone()));
    let tokens = Arc::new(TokenStore::new(db.clone(), shared.clone(), TTL_DAYS));
    let binder = Arc::new(ActivationBinder::new(
        db.clone(),
        tokens.clone(),
        shared.clone(),
    ));
    let resolver = Arc::new(TierResolver::new(db, shared));

    let state = AppState {
        registry,
        binder,
        tokens,
        resolver,
        admin_secret,
        download_url: DOWNLOAD_URL.to_string(),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        clock,
    }
}

/// Issues a pro key through the admin endpoint, returning the key string.
pub async fn issue_pro_key(server: &TestServer, max_activations: u32) -> String {
    let resp = reqwest::Client::new()
        .post(format!("{}/admin/license/issue", server.base))
        .bearer_auth(ADMIN_SECRET)
        .json(&serde_json::json!({
            "tier": "pro",
            "max_activations": max_activations,
            "email": "buyer@example.com",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["key"].as_str().unwrap().to_string()
}

/// Activates a key for a hwid, returning the full response body.
pub async fn activate(server: &TestServer, key: &str, hwid: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/license/activate", server.base))
        .json(&serde_json::json!({"key": key, "hwid": hwid}))
        .send()
        .await
        .unwrap()
}

/// Validates a token for a hwid, returning the full response.
pub async fn validate(server: &TestServer, token: &str, hwid: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/license/validate", server.base))
        .json(&serde_json::json!({"token": token, "hwid": hwid}))
        .send()
        .await
        .unwrap()
}
