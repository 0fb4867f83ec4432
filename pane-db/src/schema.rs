//! Database schema, applied on every open.
//!
//! All timestamps are integer seconds since the Unix epoch. Row ownership:
//! `license_keys` belongs to the key registry, `activations` and `devices`
//! to the activation binder, `tokens` to the token store, `device_tiers`
//! to the tier resolver.

use crate::error::{StoreError, StoreResult};
use rusqlite::Connection;

const DDL: &str = "
CREATE TABLE IF NOT EXISTS license_keys (
    id               INTEGER PRIMARY KEY,
    key              TEXT UNIQUE NOT NULL,
    tier             TEXT NOT NULL,
    max_activations  INTEGER NOT NULL,
    max_concurrent   INTEGER NOT NULL,
    email            TEXT NOT NULL,
    sale_ref         TEXT UNIQUE,
    issued_at        INTEGER NOT NULL,
    revoked          INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS devices (
    hwid           TEXT PRIMARY KEY,
    first_seen_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS activations (
    key_id      INTEGER NOT NULL REFERENCES license_keys(id),
    hwid        TEXT NOT NULL,
    created_at  INTEGER NOT NULL,
    UNIQUE(key_id, hwid)
);

CREATE TABLE IF NOT EXISTS tokens (
    id              INTEGER PRIMARY KEY,
    token           TEXT UNIQUE NOT NULL,
    key_id          INTEGER NOT NULL REFERENCES license_keys(id),
    hwid            TEXT NOT NULL,
    tier            TEXT NOT NULL,
    max_concurrent  INTEGER NOT NULL,
    issued_at       INTEGER NOT NULL,
    expires_at      INTEGER NOT NULL,
    revoked         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS device_tiers (
    hwid            TEXT PRIMARY KEY,
    tier            TEXT NOT NULL,
    max_concurrent  INTEGER,
    updated_at      INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activations_key ON activations(key_id);
CREATE INDEX IF NOT EXISTS idx_tokens_key ON tokens(key_id);
CREATE INDEX IF NOT EXISTS idx_tokens_hwid ON tokens(hwid);
";

/// Applies the schema. Idempotent; safe to run on an existing database.
pub fn migrate(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(DDL)
        .map_err(|e| StoreError::Migration(e.to_string()))
}
