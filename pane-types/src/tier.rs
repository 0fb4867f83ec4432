//! License tiers and their feature caps.
//!
//! A tier decides how many windows the desktop client may manage at once.
//! `free` is the implicit baseline for devices without any grant; license
//! keys are only ever issued for the paid tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Capability class granted to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Unpaid baseline (single window).
    Free,
    /// Entry-level paid tier.
    Starter,
    /// Full paid tier.
    Pro,
}

impl Tier {
    /// Returns the default concurrent-window cap for this tier.
    #[must_use]
    pub fn default_max_concurrent(&self) -> u32 {
        match self {
            Self::Free => 1,
            Self::Starter => 2,
            Self::Pro => 5,
        }
    }

    /// Returns true for tiers that can be sold as license keys.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }

    /// Default license-key prefix for this tier.
    #[must_use]
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Starter => "START",
            Self::Pro => "PRO",
        }
    }

    /// Canonical lowercase name, as stored and sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tier name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tier: {0}")]
pub struct ParseTierError(pub String);

impl FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "starter" => Ok(Self::Starter),
            "pro" => Ok(Self::Pro),
            other => Err(ParseTierError(other.to_string())),
        }
    }
}
