//! Activation Binder: consumes per-key device slots and mints tokens.
//!
//! The slot check and the activation insert run inside one IMMEDIATE
//! transaction that re-reads key state, so concurrent activations racing
//! for the last free slot of a key serialize: exactly one wins, the rest
//! see `ActivationLimitExceeded`, and the consumed count stays correct.

use crate::clock::SharedClock;
use crate::error::{LicenseError, LicenseResult};
use crate::registry::{self, LicenseKey};
use crate::token::TokenStore;
use pane_db::{Db, StoreError};
use pane_types::{Hwid, Tier};
use rusqlite::params;
use std::sync::Arc;
use tracing::info;

/// Result of a successful activation.
#[derive(Debug, Clone)]
pub struct Activated {
    /// Fresh bearer token for subsequent validations.
    pub token: String,
    /// End of the token's validity window (epoch seconds, exclusive).
    pub expires_at: i64,
    /// Tier granted by the key.
    pub tier: Tier,
    /// Concurrent-window cap granted by the key.
    pub max_concurrent: u32,
    /// True when this hwid already held a slot on the key.
    pub reactivated: bool,
}

/// Owns the `activations` table (and device first-seen rows).
pub struct ActivationBinder {
    db: Arc<Db>,
    tokens: Arc<TokenStore>,
    clock: SharedClock,
}

impl ActivationBinder {
    /// Creates a binder that delegates successful activations to `tokens`.
    pub fn new(db: Arc<Db>, tokens: Arc<TokenStore>, clock: SharedClock) -> Self {
        Self { db, tokens, clock }
    }

    /// Activates `key` for `hwid` and mints a bearer token.
    ///
    /// Re-activating an already-bound hwid is idempotent: it never consumes
    /// a slot, and it mints a fresh token while the old one stays valid
    /// until its own expiry.
    pub fn activate(&self, key: &str, hwid: &Hwid) -> LicenseResult<Activated> {
        let key = registry::normalize_key(key)?;
        let now = self.clock.now();

        let (lic, reactivated) = self.db.with_tx::<_, LicenseError>(|tx| {
            let lic = registry::fetch_by_key(tx, key)
                .map_err(StoreError::from)?
                .ok_or(LicenseError::LicenseNotFound)?;
            if lic.revoked {
                return Err(LicenseError::LicenseRevoked);
            }

            let already_bound: bool = tx
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM activations WHERE key_id = ?1 AND hwid = ?2)",
                    params![lic.id, hwid.as_str()],
                    |row| row.get(0),
                )
                .map_err(StoreError::from)?;
            if already_bound {
                return Ok((lic, true));
            }

            let used: u32 = tx
                .query_row(
                    "SELECT COUNT(DISTINCT hwid) FROM activations WHERE key_id = ?1",
                    [lic.id],
                    |row| row.get(0),
                )
                .map_err(StoreError::from)?;
            if used >= lic.max_activations {
                return Err(LicenseError::ActivationLimitExceeded {
                    max: lic.max_activations,
                });
            }

            tx.execute(
                "INSERT INTO activations(key_id, hwid, created_at) VALUES (?1, ?2, ?3)",
                params![lic.id, hwid.as_str(), now],
            )
            .map_err(StoreError::from)?;
            tx.execute(
                "INSERT OR IGNORE INTO devices(hwid, first_seen_at) VALUES (?1, ?2)",
                params![hwid.as_str(), now],
            )
            .map_err(StoreError::from)?;
            Ok((lic, false))
        })?;

        let minted = self
            .tokens
            .mint(lic.id, hwid, lic.tier, lic.max_concurrent)?;
        info!(key_id = lic.id, reactivated, "activation granted");

        Ok(Activated {
            token: minted.token,
            expires_at: minted.expires_at,
            tier: lic.tier,
            max_concurrent: lic.max_concurrent,
            reactivated,
        })
    }

    /// Number of activation slots consumed on a key.
    pub fn activations_used(&self, key: &str) -> LicenseResult<u32> {
        let key = registry::normalize_key(key)?;
        let lic: LicenseKey = self
            .db
            .with_read(|conn| registry::fetch_by_key(conn, key).map_err(StoreError::from))?
            .ok_or(LicenseError::LicenseNotFound)?;
        let used = self.db.with_read(|conn| {
            conn.query_row(
                "SELECT COUNT(DISTINCT hwid) FROM activations WHERE key_id = ?1",
                [lic.id],
                |row| row.get(0),
            )
            .map_err(StoreError::from)
        })?;
        Ok(used)
    }
}
