//! Domain records persisted by the store and carried by backups.
//!
//! # Responsibility
//! - Define the project/idea/character/chapter/scene records and their
//!   creation and partial-update payloads.
//! - Own the JSON field naming used by backup documents (`camelCase`).
//!
//! # Invariants
//! - Identifiers are opaque strings; fresh ids are UUID v4 strings.
//! - Timestamps are Unix epoch milliseconds.
//! - Unknown JSON fields survive a decode/encode cycle through `extra`.

use crate::clock::now_ms;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub mod character;
pub mod idea;
pub mod idea_type;
pub mod outline;
pub mod project;

/// Allocates a fresh opaque record identifier.
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamp field that falls back to "now" when null.
pub(crate) fn null_as_now<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_else(now_ms))
}
