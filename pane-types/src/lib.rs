//! Core type definitions shared across the Pane licensing backend.

mod hwid;
mod tier;

pub use hwid::{Hwid, HwidError};
pub use tier::{ParseTierError, Tier};
