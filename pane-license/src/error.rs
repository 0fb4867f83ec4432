//! Error types for licensing operations.
//!
//! Every licensing failure carries a stable machine-readable reason code;
//! callers surface that code instead of internal fault details.

use pane_db::StoreError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// No license key row matches the presented key.
    #[error("license key not found")]
    LicenseNotFound,

    /// The key exists but has been revoked; new activations are rejected.
    #[error("license key has been revoked")]
    LicenseRevoked,

    /// All activation slots of the key are consumed by other devices.
    #[error("activation limit exceeded (max {max} devices)")]
    ActivationLimitExceeded {
        /// The key's activation cap.
        max: u32,
    },

    /// No token row matches the presented token.
    #[error("token not found")]
    TokenNotFound,

    /// The token has been revoked.
    #[error("token has been revoked")]
    TokenRevoked,

    /// The token's validity window has passed.
    #[error("token has expired")]
    TokenExpired,

    /// The token is bound to a different hardware id.
    #[error("token is bound to a different device")]
    HwidMismatch,

    /// Freshly generated key collided twice in a row.
    #[error("license key collision")]
    DuplicateKey,

    /// Malformed or out-of-range request input.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Unexpected internal fault (e.g. repeated token-space collision).
    #[error("internal error: {0}")]
    Internal(String),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LicenseError {
    /// Stable snake_case reason code for the wire.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::LicenseNotFound => "license_not_found",
            Self::LicenseRevoked => "license_revoked",
            Self::ActivationLimitExceeded { .. } => "activation_limit_exceeded",
            Self::TokenNotFound => "token_not_found",
            Self::TokenRevoked => "token_revoked",
            Self::TokenExpired => "token_expired",
            Self::HwidMismatch => "hwid_mismatch",
            Self::DuplicateKey => "duplicate_key",
            Self::Invalid(_) => "validation_error",
            Self::Internal(_) => "internal_error",
            Self::Store(e) if e.is_transient() => "transient_failure",
            Self::Store(_) => "internal_error",
        }
    }

    /// Returns true for failures the caller may safely retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
