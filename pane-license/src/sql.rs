//! Small rusqlite conversion helpers shared by the component stores.

use pane_types::Tier;
use rusqlite::types::Type;
use std::str::FromStr;

/// Converts a stored tier name back into a [`Tier`], reporting a proper
/// column-conversion failure on corrupt data instead of panicking.
pub(crate) fn tier_from_column(idx: usize, raw: &str) -> rusqlite::Result<Tier> {
    Tier::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Detects a UNIQUE-constraint violation, used to tell a random key or
/// token collision apart from other database failures.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
