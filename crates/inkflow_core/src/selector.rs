//! Persisted "current project" pointer.
//!
//! # Responsibility
//! - Remember which project the writer is working on across restarts.
//! - Keep that pointer outside the database so it survives (and is written
//!   after) database transactions.
//!
//! # Invariants
//! - `get` always yields a usable, non-blank id.
//! - Slot failures never reach the caller; they are logged and replaced by the
//!   default project id.

use crate::error::{failure_policy, Component, FailurePolicy};
use crate::model::project::{ProjectId, DEFAULT_PROJECT_ID};
use log::warn;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Scalar storage behind the selector.
pub trait SelectorSlot: Send {
    fn load(&self) -> io::Result<Option<String>>;
    fn store(&self, value: &str) -> io::Result<()>;
}

/// Slot backed by one small text file.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SelectorSlot for FileSlot {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn store(&self, value: &str) -> io::Result<()> {
        fs::write(&self.path, value)
    }
}

/// In-process slot for in-memory stores and tests.
#[derive(Debug, Default)]
pub struct MemorySlot {
    value: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }
}

impl SelectorSlot for MemorySlot {
    fn load(&self) -> io::Result<Option<String>> {
        let guard = self
            .value
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "selector slot lock poisoned"))?;
        Ok(guard.clone())
    }

    fn store(&self, value: &str) -> io::Result<()> {
        let mut guard = self
            .value
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "selector slot lock poisoned"))?;
        *guard = Some(value.to_string());
        Ok(())
    }
}

pub struct ProjectSelector {
    slot: Box<dyn SelectorSlot>,
}

impl ProjectSelector {
    pub fn new(slot: impl SelectorSlot + 'static) -> Self {
        Self {
            slot: Box::new(slot),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemorySlot::new())
    }

    /// Returns the selected project id, or the default id when nothing usable
    /// is stored.
    pub fn get(&self) -> ProjectId {
        match self.try_get() {
            Ok(Some(id)) => id,
            Ok(None) => DEFAULT_PROJECT_ID.to_string(),
            Err(err) => {
                swallow("selector_read", &err);
                DEFAULT_PROJECT_ID.to_string()
            }
        }
    }

    /// Persists `id`; a blank id selects the default project.
    pub fn set(&self, id: &str) {
        let value = if id.trim().is_empty() {
            DEFAULT_PROJECT_ID
        } else {
            id
        };
        if let Err(err) = self.slot.store(value) {
            swallow("selector_write", &err);
        }
    }

    pub fn has_selection(&self) -> bool {
        matches!(self.try_get(), Ok(Some(_)))
    }

    fn try_get(&self) -> io::Result<Option<ProjectId>> {
        Ok(self
            .slot
            .load()?
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }
}

fn swallow(event: &str, err: &io::Error) {
    debug_assert_eq!(
        failure_policy(Component::ProjectSelector),
        FailurePolicy::Swallow
    );
    warn!(
        "event={} module=selector status=error policy=swallow fallback={} error={}",
        event, DEFAULT_PROJECT_ID, err
    );
}

#[cfg(test)]
mod tests {
    use super::{FileSlot, MemorySlot, ProjectSelector, SelectorSlot};
    use std::io;

    struct BrokenSlot;

    impl SelectorSlot for BrokenSlot {
        fn load(&self) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }

        fn store(&self, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn empty_slot_yields_default_id() {
        let selector = ProjectSelector::in_memory();
        assert_eq!(selector.get(), "story");
        assert!(!selector.has_selection());
    }

    #[test]
    fn set_then_get_returns_value() {
        let selector = ProjectSelector::in_memory();
        selector.set("p-42");
        assert_eq!(selector.get(), "p-42");
        assert!(selector.has_selection());
    }

    #[test]
    fn blank_values_fall_back_to_default() {
        let selector = ProjectSelector::new(MemorySlot::with_value("   "));
        assert_eq!(selector.get(), "story");

        selector.set("");
        assert_eq!(selector.get(), "story");
        assert!(selector.has_selection());
    }

    #[test]
    fn slot_failures_are_swallowed() {
        let selector = ProjectSelector::new(BrokenSlot);
        selector.set("p-1");
        assert_eq!(selector.get(), "story");
        assert!(!selector.has_selection());
    }

    #[test]
    fn file_slot_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current_project_id");

        ProjectSelector::new(FileSlot::new(&path)).set("p-7");
        let reopened = ProjectSelector::new(FileSlot::new(&path));
        assert_eq!(reopened.get(), "p-7");
    }

    #[test]
    fn file_slot_treats_missing_file_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("absent"));
        assert_eq!(slot.load().unwrap(), None);
    }
}
