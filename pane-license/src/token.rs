//! Token Store: opaque bearer credentials bound to a hardware id.
//!
//! A token snapshots the tier and window cap at mint time and lives for a
//! fixed TTL. Expiry is terminal: validation never extends the window; the
//! client re-activates with its key to obtain a fresh token.

use crate::clock::SharedClock;
use crate::error::{LicenseError, LicenseResult};
use crate::keygen;
use crate::sql;
use pane_db::{Db, StoreError};
use pane_types::{Hwid, Tier};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Default validity window for minted tokens.
pub const DEFAULT_TTL_DAYS: u32 = 90;

const SECS_PER_DAY: i64 = 86_400;

/// A freshly minted bearer token.
#[derive(Debug, Clone)]
pub struct MintedToken {
    /// The opaque token string.
    pub token: String,
    /// Mint time (epoch seconds).
    pub issued_at: i64,
    /// End of the validity window (exclusive).
    pub expires_at: i64,
}

/// Tier and caps returned by a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    /// Tier snapshotted at mint time.
    pub tier: Tier,
    /// Concurrent-window cap snapshotted at mint time.
    pub max_concurrent: u32,
}

/// Full stored token record, for admin introspection.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRecord {
    /// The opaque token string.
    pub token: String,
    /// License key the token was minted from.
    pub key: String,
    /// Hardware id the token is bound to.
    pub hwid: String,
    /// Tier snapshot.
    pub tier: Tier,
    /// Window-cap snapshot.
    pub max_concurrent: u32,
    /// Mint time (epoch seconds).
    pub issued_at: i64,
    /// End of the validity window (exclusive).
    pub expires_at: i64,
    /// Whether the token has been administratively revoked.
    pub revoked: bool,
}

/// Owns the `tokens` table.
pub struct TokenStore {
    db: Arc<Db>,
    clock: SharedClock,
    ttl_days: u32,
}

impl TokenStore {
    /// Creates a token store minting tokens valid for `ttl_days`.
    pub fn new(db: Arc<Db>, clock: SharedClock, ttl_days: u32) -> Self {
        Self {
            db,
            clock,
            ttl_days,
        }
    }

    /// Mints a token bound to `hwid`, snapshotting tier and cap.
    ///
    /// A token-space collision regenerates once; a second collision is
    /// treated as fatal rather than looping on a broken RNG.
    pub(crate) fn mint(
        &self,
        key_id: i64,
        hwid: &Hwid,
        tier: Tier,
        max_concurrent: u32,
    ) -> LicenseResult<MintedToken> {
        let issued_at = self.clock.now();
        let expires_at = issued_at + i64::from(self.ttl_days) * SECS_PER_DAY;

        for last_attempt in [false, true] {
            let token = keygen::bearer_token();
            let inserted = self.db.with_conn::<_, LicenseError>(|conn| {
                match conn.execute(
                    "INSERT INTO tokens(token, key_id, hwid, tier, max_concurrent, issued_at, expires_at, revoked)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
                    params![
                        token,
                        key_id,
                        hwid.as_str(),
                        tier.as_str(),
                        max_concurrent,
                        issued_at,
                        expires_at
                    ],
                ) {
                    Ok(_) => Ok(true),
                    Err(e) if sql::is_unique_violation(&e) => Ok(false),
                    Err(e) => Err(StoreError::from(e).into()),
                }
            })?;
            if inserted {
                debug!(key_id, expires_at, "token minted");
                return Ok(MintedToken {
                    token,
                    issued_at,
                    expires_at,
                });
            }
            if last_attempt {
                break;
            }
        }
        Err(LicenseError::Internal("token space collision".to_string()))
    }

    /// Validates a token presented by `hwid`.
    ///
    /// Failure reasons are checked in priority order: unknown token,
    /// revoked, expired, then hardware-id mismatch.
    pub fn validate(&self, token: &str, hwid: &Hwid) -> LicenseResult<Grant> {
        let token = normalize_token(token)?;
        let record = self
            .db
            .with_read(|conn| fetch_record(conn, token).map_err(StoreError::from))?
            .ok_or(LicenseError::TokenNotFound)?;

        if record.revoked {
            return Err(LicenseError::TokenRevoked);
        }
        if self.clock.now() >= record.expires_at {
            return Err(LicenseError::TokenExpired);
        }
        if record.hwid != hwid.as_str() {
            return Err(LicenseError::HwidMismatch);
        }
        Ok(Grant {
            tier: record.tier,
            max_concurrent: record.max_concurrent,
        })
    }

    /// Returns the full stored record regardless of validity. Admin-only.
    pub fn introspect(&self, token: &str) -> LicenseResult<TokenRecord> {
        let token = normalize_token(token)?;
        self.db
            .with_read(|conn| fetch_record(conn, token).map_err(StoreError::from))?
            .ok_or(LicenseError::TokenNotFound)
    }

    /// Revokes a token. Idempotent and irreversible. Admin-only.
    pub fn revoke(&self, token: &str) -> LicenseResult<()> {
        let token = normalize_token(token)?;
        let changed = self.db.with_conn::<_, LicenseError>(|conn| {
            conn.execute("UPDATE tokens SET revoked = 1 WHERE token = ?1", [token])
                .map_err(|e| StoreError::from(e).into())
        })?;
        if changed == 0 {
            return Err(LicenseError::TokenNotFound);
        }
        info!("token revoked");
        Ok(())
    }
}

fn normalize_token(raw: &str) -> LicenseResult<&str> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(LicenseError::Invalid("token is empty".to_string()));
    }
    Ok(token)
}

fn fetch_record(conn: &Connection, token: &str) -> rusqlite::Result<Option<TokenRecord>> {
    conn.query_row(
        "SELECT t.token, k.key, t.hwid, t.tier, t.max_concurrent, t.issued_at, t.expires_at, t.revoked
         FROM tokens t JOIN license_keys k ON k.id = t.key_id
         WHERE t.token = ?1",
        [token],
        |row| {
            let tier_raw: String = row.get(3)?;
            Ok(TokenRecord {
                token: row.get(0)?,
                key: row.get(1)?,
                hwid: row.get(2)?,
                tier: sql::tier_from_column(3, &tier_raw)?,
                max_concurrent: row.get(4)?,
                issued_at: row.get(5)?,
                expires_at: row.get(6)?,
                revoked: row.get(7)?,
            })
        },
    )
    .optional()
}
