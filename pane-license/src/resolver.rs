//! Tier Resolver: tokenless hwid → tier capability probes.
//!
//! Device-tier grants are independent of license keys; they are how
//! referral-style rewards or support overrides reach a device. `verify` is
//! a pure read: an unknown hwid resolves to the free baseline and no row
//! is created.

use crate::clock::SharedClock;
use crate::error::{LicenseError, LicenseResult};
use crate::sql;
use pane_db::{Db, StoreError};
use pane_types::{Hwid, Tier};
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// The tier and window cap a device currently resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceTier {
    /// Granted tier, `free` when no grant exists.
    pub tier: Tier,
    /// Window cap: the grant's override when set, else the tier default.
    pub max_concurrent: u32,
}

/// Owns the `device_tiers` table.
pub struct TierResolver {
    db: Arc<Db>,
    clock: SharedClock,
}

impl TierResolver {
    /// Creates a resolver over the shared database.
    pub fn new(db: Arc<Db>, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    /// Resolves the grant for a hardware id.
    pub fn verify(&self, hwid: &Hwid) -> LicenseResult<DeviceTier> {
        let grant = self.db.with_read(|conn| {
            conn.query_row(
                "SELECT tier, max_concurrent FROM device_tiers WHERE hwid = ?1",
                [hwid.as_str()],
                |row| {
                    let tier_raw: String = row.get(0)?;
                    let tier = sql::tier_from_column(0, &tier_raw)?;
                    let cap: Option<u32> = row.get(1)?;
                    Ok((tier, cap))
                },
            )
            .optional()
            .map_err(StoreError::from)
        })?;

        Ok(match grant {
            Some((tier, cap)) => DeviceTier {
                tier,
                max_concurrent: cap.unwrap_or_else(|| tier.default_max_concurrent()),
            },
            None => DeviceTier {
                tier: Tier::Free,
                max_concurrent: Tier::Free.default_max_concurrent(),
            },
        })
    }

    /// Upserts a device-tier grant. Admin-only.
    ///
    /// Registers the device row as well, so a grant can precede the
    /// device's first activation.
    pub fn grant(
        &self,
        hwid: &Hwid,
        tier: Tier,
        max_concurrent: Option<u32>,
    ) -> LicenseResult<()> {
        if max_concurrent == Some(0) {
            return Err(LicenseError::Invalid(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        let now = self.clock.now();
        self.db.with_tx::<_, LicenseError>(|tx| {
            tx.execute(
                "INSERT OR IGNORE INTO devices(hwid, first_seen_at) VALUES (?1, ?2)",
                params![hwid.as_str(), now],
            )
            .map_err(StoreError::from)?;
            tx.execute(
                "INSERT INTO device_tiers(hwid, tier, max_concurrent, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(hwid) DO UPDATE SET
                   tier = excluded.tier,
                   max_concurrent = excluded.max_concurrent,
                   updated_at = excluded.updated_at",
                params![hwid.as_str(), tier.as_str(), max_concurrent, now],
            )
            .map_err(StoreError::from)?;
            Ok(())
        })?;
        info!(tier = %tier, "device tier granted");
        Ok(())
    }
}
