//! Store-boundary errors and the failure policy per component.
//!
//! # Responsibility
//! - Classify failures into storage errors (persistence) and validation errors
//!   (untrusted backup input) so callers can tell them apart.
//! - Attach a short remediation hint to every storage error, chosen by the
//!   operation that failed.
//! - Record which components propagate failures and which swallow them.
//!
//! # Invariants
//! - Only the current-project selector swallows its failures.
//! - Validation errors never wrap a persistence cause.

use crate::db::DbError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Components of the storage core, as named by the failure policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    SchemaMigration,
    EntityStore,
    BackupCodec,
    ProjectSelector,
}

/// What a component does with a persistence failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Returned to the immediate caller, once, without retry.
    Propagate,
    /// Logged and replaced by a fallback value.
    Swallow,
}

pub const FAILURE_POLICIES: [(Component, FailurePolicy); 4] = [
    (Component::SchemaMigration, FailurePolicy::Propagate),
    (Component::EntityStore, FailurePolicy::Propagate),
    (Component::BackupCodec, FailurePolicy::Propagate),
    (Component::ProjectSelector, FailurePolicy::Swallow),
];

pub fn failure_policy(component: Component) -> FailurePolicy {
    FAILURE_POLICIES
        .iter()
        .find(|(entry, _)| *entry == component)
        .map_or(FailurePolicy::Propagate, |(_, policy)| *policy)
}

/// Store operation that touched persistence, used to pick the hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Open,
    LoadProjects,
    LoadProject,
    SaveProject,
    Read,
    Write,
    SaveScene,
    Export,
    Import,
}

impl StorageOp {
    /// Localization key of the remediation hint.
    pub fn hint_key(self) -> &'static str {
        match self {
            Self::Open => "errors.storage.open",
            Self::LoadProjects => "errors.storage.loadProjects",
            Self::LoadProject => "errors.storage.loadProject",
            Self::SaveProject => "errors.storage.saveProject",
            Self::Read => "errors.storage.read",
            Self::Write => "errors.storage.write",
            Self::SaveScene => "errors.storage.saveScene",
            Self::Export => "errors.storage.export",
            Self::Import => "errors.storage.import",
        }
    }

    /// English remediation hint.
    pub fn hint(self) -> &'static str {
        match self {
            Self::Open => "Could not open local storage. If you're in private browsing or out of space, try another browser or window.",
            Self::LoadProjects => "Could not load your projects. If you're in private browsing or out of space, try another browser or window.",
            Self::LoadProject => "Could not load your project. If you're in private browsing or out of space, try another browser or window.",
            Self::SaveProject => "Could not save. If you're in private browsing or out of space, try downloading a backup and using a normal window.",
            Self::Read => "Could not load your notes. If you're in private browsing or out of space, try another browser or window.",
            Self::Write => "Could not save your changes. If you're in private browsing or out of space, try downloading a backup and using a normal window.",
            Self::SaveScene => "Could not save scene. If you're in private browsing or out of space, try downloading a backup and using a normal window.",
            Self::Export => "Could not create backup. Try again or copy your text elsewhere.",
            Self::Import => "Import failed. Your current project was not changed.",
        }
    }
}

/// Persistence failure with the operation it happened in.
#[derive(Debug)]
pub struct StorageError {
    op: StorageOp,
    cause: RepoError,
}

impl StorageError {
    pub fn new(op: StorageOp, cause: RepoError) -> Self {
        Self { op, cause }
    }

    pub fn op(&self) -> StorageOp {
        self.op
    }

    pub fn cause(&self) -> &RepoError {
        &self.cause
    }

    pub fn hint(&self) -> &'static str {
        self.op.hint()
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.op {
            StorageOp::Import => write!(
                f,
                "Import failed: {}. Your current project was not changed.",
                self.cause
            ),
            other => f.write_str(other.hint()),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

/// Structural problem with an untrusted backup document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Not an object, or none of the recognised backup markers are present.
    NotABackup,
    /// Input text is not JSON at all.
    Malformed(String),
    /// A collection field is present but not an array.
    NotAnArray(&'static str),
}

impl ValidationError {
    pub fn hint_key(&self) -> &'static str {
        match self {
            Self::NotABackup | Self::Malformed(_) => "errors.import.notABackup",
            Self::NotAnArray(_) => "errors.import.notAnArray",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotABackup => write!(
                f,
                "This file doesn't look like an InkFlow backup. Use a file you exported from this app."
            ),
            Self::Malformed(detail) => write!(
                f,
                "This file doesn't look like an InkFlow backup ({detail}). Use a file you exported from this app."
            ),
            Self::NotAnArray(field) => {
                write!(f, "Invalid backup format: {field} must be an array.")
            }
        }
    }
}

impl Error for ValidationError {}

/// Error returned by every fallible store operation.
#[derive(Debug)]
pub enum StoreError {
    Storage(StorageError),
    Validation(ValidationError),
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    pub fn hint_key(&self) -> &'static str {
        match self {
            Self::Storage(err) => err.op().hint_key(),
            Self::Validation(err) => err.hint_key(),
        }
    }

    /// User-facing message, translated when `translate` knows the key.
    pub fn localized_hint(&self, translate: impl Fn(&str) -> Option<String>) -> String {
        translate(self.hint_key()).unwrap_or_else(|| self.to_string())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => err.source(),
            Self::Validation(_) => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Tags a low-level failure with the store operation it happened in.
pub(crate) trait StorageContext<T> {
    fn during(self, op: StorageOp) -> StoreResult<T>;
}

impl<T> StorageContext<T> for Result<T, RepoError> {
    fn during(self, op: StorageOp) -> StoreResult<T> {
        self.map_err(|cause| StoreError::Storage(StorageError::new(op, cause)))
    }
}

impl<T> StorageContext<T> for Result<T, DbError> {
    fn during(self, op: StorageOp) -> StoreResult<T> {
        self.map_err(|cause| StoreError::Storage(StorageError::new(op, RepoError::Db(cause))))
    }
}

impl<T> StorageContext<T> for Result<T, rusqlite::Error> {
    fn during(self, op: StorageOp) -> StoreResult<T> {
        self.map_err(|cause| StoreError::Storage(StorageError::new(op, RepoError::from(cause))))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        failure_policy, Component, FailurePolicy, StorageError, StorageOp, StoreError,
        ValidationError,
    };
    use crate::repo::RepoError;

    #[test]
    fn only_selector_swallows_failures() {
        assert_eq!(
            failure_policy(Component::ProjectSelector),
            FailurePolicy::Swallow
        );
        for component in [
            Component::SchemaMigration,
            Component::EntityStore,
            Component::BackupCodec,
        ] {
            assert_eq!(failure_policy(component), FailurePolicy::Propagate);
        }
    }

    #[test]
    fn import_failure_message_names_cause_and_reassures() {
        let err = StoreError::Storage(StorageError::new(
            StorageOp::Import,
            RepoError::InvalidData("duplicate id".to_string()),
        ));
        let message = err.to_string();
        assert!(message.starts_with("Import failed: invalid data: duplicate id"));
        assert!(message.ends_with("Your current project was not changed."));
        assert!(err.is_storage());
    }

    #[test]
    fn write_failures_suggest_downloading_a_backup() {
        let err = StorageError::new(StorageOp::Write, RepoError::InvalidData("x".to_string()));
        assert!(err.to_string().contains("downloading a backup"));
        assert!(StorageOp::Read.hint().contains("another browser or window"));
    }

    #[test]
    fn localized_hint_falls_back_to_english() {
        let err = StoreError::from(ValidationError::NotAnArray("ideas"));
        assert!(err.is_validation());
        assert_eq!(
            err.localized_hint(|_| None),
            "Invalid backup format: ideas must be an array."
        );
        assert_eq!(
            err.localized_hint(|key| Some(format!("t({key})"))),
            "t(errors.import.notAnArray)"
        );
    }
}
