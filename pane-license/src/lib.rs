//! Licensing and activation for the Pane backend.
//!
//! This crate implements the trust core of the licensing server:
//! - Key registry: issuance, lookup, and revocation of license keys
//! - Activation binder: consumes per-key device slots, idempotent per hwid
//! - Token store: short-lived opaque bearer tokens bound to a hardware id
//! - Tier resolver: tokenless hwid → tier capability probes
//!
//! # Design Principles
//!
//! - **Opaque credentials**: keys and tokens carry no client-verifiable
//!   structure; every decision is a server-side lookup
//! - **Device binding**: a token only validates from the hardware id it
//!   was minted for
//! - **Atomic slot accounting**: the activation limit is enforced inside a
//!   single transaction, so racing activations can never oversell a key
//! - **Injected clock**: expiry decisions go through the [`Clock`] trait
//!   and are deterministic under test

mod binder;
mod clock;
mod error;
mod keygen;
mod registry;
mod resolver;
mod sql;
mod token;

pub use binder::{Activated, ActivationBinder};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{LicenseError, LicenseResult};
pub use registry::{IssueParams, KeyRegistry, LicenseKey};
pub use resolver::{DeviceTier, TierResolver};
pub use token::{DEFAULT_TTL_DAYS, Grant, MintedToken, TokenRecord, TokenStore};
