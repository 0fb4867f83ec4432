//! Hardware id: the opaque fingerprint a desktop client presents.
//!
//! The server never interprets the contents; it only requires a stable,
//! non-empty string to bind activations and tokens to.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum accepted length for a hardware id, after trimming.
pub const MAX_HWID_LEN: usize = 256;

/// Error returned when a presented hardware id is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HwidError {
    /// The id was empty (or whitespace only).
    #[error("hardware id is empty")]
    Empty,
    /// The id exceeded [`MAX_HWID_LEN`] characters.
    #[error("hardware id exceeds {MAX_HWID_LEN} characters")]
    TooLong,
}

/// An opaque, validated hardware fingerprint string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hwid(String);

impl Hwid {
    /// Validates and normalizes a raw hardware id (trims whitespace).
    pub fn parse(raw: &str) -> Result<Self, HwidError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(HwidError::Empty);
        }
        if trimmed.chars().count() > MAX_HWID_LEN {
            return Err(HwidError::TooLong);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the normalized id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hwid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
