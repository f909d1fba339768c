//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Isolate SQLite query details from the store facade.
//!
//! # Invariants
//! - Repositories borrow a migrated connection (or a transaction through
//!   deref) and never open transactions of their own, except the chapter
//!   cascade delete.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Unknown JSON fields of a record are kept in the `extra_json` column.

use crate::db::DbError;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod character_repo;
pub mod idea_repo;
pub mod idea_type_repo;
pub mod outline_repo;
pub mod project_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn encode_extra(extra: &Map<String, Value>) -> RepoResult<String> {
    serde_json::to_string(extra)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode extra fields: {err}")))
}

pub(crate) fn decode_extra(text: &str, table: &str, id: &str) -> RepoResult<Map<String, Value>> {
    serde_json::from_str(text).map_err(|err| {
        RepoError::InvalidData(format!("invalid extra_json in {table} row `{id}`: {err}"))
    })
}

/// Unwraps a scoping column that must not be NULL after migration.
pub(crate) fn require_scope(
    value: Option<String>,
    table: &str,
    column: &str,
    id: &str,
) -> RepoResult<String> {
    value.ok_or_else(|| {
        RepoError::InvalidData(format!("{table} row `{id}` has no {column}"))
    })
}
