//! Shared test harness for the licensing components.

#![allow(dead_code)]

use pane_db::Db;
use pane_license::{
    ActivationBinder, IssueParams, KeyRegistry, ManualClock, SharedClock, TierResolver, TokenStore,
};
use pane_types::{Hwid, Tier};
use std::sync::Arc;

/// Fixed epoch second all harness clocks start at.
pub const T0: i64 = 1_750_000_000;
/// Token TTL used by the harness.
pub const TTL_DAYS: u32 = 90;
/// The TTL in seconds.
pub const TTL_SECS: i64 = TTL_DAYS as i64 * 86_400;

pub struct Harness {
    pub db: Arc<Db>,
    pub clock: Arc<ManualClock>,
    pub registry: Arc<KeyRegistry>,
    pub binder: Arc<ActivationBinder>,
    pub tokens: Arc<TokenStore>,
    pub resolver: Arc<TierResolver>,
}

/// Builds all components over one in-memory database and a manual clock.
pub fn harness() -> Harness {
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
    let resolver = Arc::new(TierResolver::new(db.clone(), shared));

    Harness {
        db,
        clock,
        registry,
        binder,
        tokens,
        resolver,
    }
}

pub fn hwid(s: &str) -> Hwid {
    Hwid::parse(s).unwrap()
}

/// Issue parameters for a pro key with the given slot count.
pub fn pro_params(max_activations: u32) -> IssueParams {
    IssueParams {
        tier: Tier::Pro,
        max_activations,
        max_concurrent: 5,
        email: "buyer@example.com".to_string(),
        prefix: None,
        sale_ref: None,
    }
}
