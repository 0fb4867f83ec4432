//! Key Registry: issuance, lookup, and revocation of license keys.
//!
//! Issuance is idempotent per external sale reference: replaying the same
//! `sale_ref` (a payment provider's sale id) returns the key minted the
//! first time instead of duplicating entitlement.

use crate::clock::SharedClock;
use crate::error::{LicenseError, LicenseResult};
use crate::keygen;
use crate::sql;
use pane_db::{Db, StoreError};
use pane_types::Tier;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Arc;
use tracing::{debug, info};

/// A stored license key.
#[derive(Debug, Clone)]
pub struct LicenseKey {
    /// Row id, referenced by activations and tokens.
    pub id: i64,
    /// The key string handed to the buyer.
    pub key: String,
    /// Tier granted on activation.
    pub tier: Tier,
    /// How many distinct devices may activate this key.
    pub max_activations: u32,
    /// Concurrent-window cap snapshotted into minted tokens.
    pub max_concurrent: u32,
    /// Buyer email the key was issued to.
    pub email: String,
    /// External sale reference, when issued from a payment event.
    pub sale_ref: Option<String>,
    /// Issuance time (epoch seconds).
    pub issued_at: i64,
    /// Revoked keys reject new activations; existing tokens are untouched.
    pub revoked: bool,
}

/// Parameters for issuing a new license key.
#[derive(Debug, Clone)]
pub struct IssueParams {
    /// Tier to grant; must be a paid tier.
    pub tier: Tier,
    /// Activation slot count, at least 1.
    pub max_activations: u32,
    /// Concurrent-window cap, at least 1.
    pub max_concurrent: u32,
    /// Buyer email.
    pub email: String,
    /// Custom key prefix; defaults to the tier's prefix.
    pub prefix: Option<String>,
    /// External sale id for idempotent issuance.
    pub sale_ref: Option<String>,
}

/// Owns the `license_keys` table.
pub struct KeyRegistry {
    db: Arc<Db>,
    clock: SharedClock,
}

impl KeyRegistry {
    /// Creates a registry over the shared database.
    pub fn new(db: Arc<Db>, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    /// Issues a new license key.
    ///
    /// A random key collision is retried once with a fresh suffix; a second
    /// collision surfaces as [`LicenseError::DuplicateKey`].
    pub fn issue(&self, params: &IssueParams) -> LicenseResult<LicenseKey> {
        if !params.tier.is_paid() {
            return Err(LicenseError::Invalid(
                "tier must be starter or pro".to_string(),
            ));
        }
        if params.max_activations == 0 {
            return Err(LicenseError::Invalid(
                "max_activations must be at least 1".to_string(),
            ));
        }
        if params.max_concurrent == 0 {
            return Err(LicenseError::Invalid(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        let email = params.email.trim();
        if !email.contains('@') {
            return Err(LicenseError::Invalid("buyer email is not valid".to_string()));
        }
        let prefix = effective_prefix(params)?;
        let sale_ref = params
            .sale_ref
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let now = self.clock.now();

        let issued = self.db.with_tx::<_, LicenseError>(|tx| {
            if let Some(sale_ref) = sale_ref {
                if let Some(existing) = fetch_by_sale_ref(tx, sale_ref).map_err(StoreError::from)? {
                    debug!(sale_ref, "issue replayed for known sale");
                    return Ok(existing);
                }
            }
            for last_attempt in [false, true] {
                let key = keygen::license_key(&prefix);
                match insert_key(tx, &key, params, email, sale_ref, now) {
                    Ok(id) => {
                        return Ok(LicenseKey {
                            id,
                            key,
                            tier: params.tier,
                            max_activations: params.max_activations,
                            max_concurrent: params.max_concurrent,
                            email: email.to_string(),
                            sale_ref: sale_ref.map(str::to_string),
                            issued_at: now,
                            revoked: false,
                        });
                    }
                    Err(e) if sql::is_unique_violation(&e) => {
                        if last_attempt {
                            return Err(LicenseError::DuplicateKey);
                        }
                    }
                    Err(e) => return Err(StoreError::from(e).into()),
                }
            }
            Err(LicenseError::DuplicateKey)
        })?;

        info!(key_id = issued.id, tier = %issued.tier, "license key issued");
        Ok(issued)
    }

    /// Looks up a key. Returns revoked keys too, with the flag set.
    pub fn lookup(&self, key: &str) -> LicenseResult<LicenseKey> {
        let key = normalize_key(key)?;
        self.db
            .with_read(|conn| fetch_by_key(conn, key).map_err(StoreError::from))?
            .ok_or(LicenseError::LicenseNotFound)
    }

    /// Revokes a key. Idempotent: re-revoking an already revoked key is ok.
    ///
    /// Tokens previously minted from the key stay valid until they expire.
    pub fn revoke(&self, key: &str) -> LicenseResult<()> {
        let key = normalize_key(key)?;
        let changed = self.db.with_conn::<_, LicenseError>(|conn| {
            conn.execute("UPDATE license_keys SET revoked = 1 WHERE key = ?1", [key])
                .map_err(|e| StoreError::from(e).into())
        })?;
        if changed == 0 {
            return Err(LicenseError::LicenseNotFound);
        }
        info!("license key revoked");
        Ok(())
    }
}

/// Trims a presented key and rejects empty input.
pub(crate) fn normalize_key(raw: &str) -> LicenseResult<&str> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(LicenseError::Invalid("license key is empty".to_string()));
    }
    Ok(key)
}

/// Fetches a key row by key string. Shared with the activation binder,
/// which re-reads key state inside its activation transaction.
pub(crate) fn fetch_by_key(conn: &Connection, key: &str) -> rusqlite::Result<Option<LicenseKey>> {
    conn.query_row(
        "SELECT id, key, tier, max_activations, max_concurrent, email, sale_ref, issued_at, revoked
         FROM license_keys WHERE key = ?1",
        [key],
        row_to_key,
    )
    .optional()
}

fn fetch_by_sale_ref(conn: &Connection, sale_ref: &str) -> rusqlite::Result<Option<LicenseKey>> {
    conn.query_row(
        "SELECT id, key, tier, max_activations, max_concurrent, email, sale_ref, issued_at, revoked
         FROM license_keys WHERE sale_ref = ?1",
        [sale_ref],
        row_to_key,
    )
    .optional()
}

fn insert_key(
    conn: &Connection,
    key: &str,
    params: &IssueParams,
    email: &str,
    sale_ref: Option<&str>,
    now: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO license_keys(key, tier, max_activations, max_concurrent, email, sale_ref, issued_at, revoked)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
        params![
            key,
            params.tier.as_str(),
            params.max_activations,
            params.max_concurrent,
            email,
            sale_ref,
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_key(row: &rusqlite::Row<'_>) -> rusqlite::Result<LicenseKey> {
    let tier_raw: String = row.get(2)?;
    Ok(LicenseKey {
        id: row.get(0)?,
        key: row.get(1)?,
        tier: sql::tier_from_column(2, &tier_raw)?,
        max_activations: row.get(3)?,
        max_concurrent: row.get(4)?,
        email: row.get(5)?,
        sale_ref: row.get(6)?,
        issued_at: row.get(7)?,
        revoked: row.get(8)?,
    })
}

fn effective_prefix(params: &IssueParams) -> LicenseResult<String> {
    match params
        .prefix
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        None => Ok(params.tier.key_prefix().to_string()),
        Some(raw) => {
            let upper = raw.to_ascii_uppercase();
            let valid = (2..=10).contains(&upper.len())
                && upper
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
            if !valid {
                return Err(LicenseError::Invalid(
                    "prefix must be 2-10 uppercase alphanumerics".to_string(),
                ));
            }
            Ok(upper)
        }
    }
}
