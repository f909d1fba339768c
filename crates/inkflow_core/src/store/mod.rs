//! Store facade: the single entry point callers use for InkFlow data.
//!
//! # Responsibility
//! - Own one migrated SQLite connection and the current-project selector.
//! - Scope list/add operations to the current project by default.
//! - Tag every persistence failure with the operation that failed.
//!
//! # Invariants
//! - A `Store` is only constructed over a fully migrated connection.
//! - Independent `Store` values never share state.
//! - Selector writes happen outside database transactions.

use crate::db::{open_db, open_db_in_memory, MigrationReport, OpenedDb};
use crate::error::{StorageContext, StorageOp, StoreResult};
use crate::model::project::ProjectId;
use crate::selector::{FileSlot, ProjectSelector};
use log::info;
use rusqlite::Connection;
use std::path::PathBuf;

mod cards;
mod outline;
mod projects;

/// Database file name inside the data directory.
pub const DATABASE_FILE_NAME: &str = "inkflow.sqlite3";
/// Selector slot file name inside the data directory.
pub const SELECTOR_FILE_NAME: &str = "current_project_id";

/// Where a file-backed store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Existing directory holding the database and the selector slot.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }

    pub fn selector_path(&self) -> PathBuf {
        self.data_dir.join(SELECTOR_FILE_NAME)
    }
}

/// Handle over one InkFlow database.
pub struct Store {
    pub(crate) conn: Connection,
    pub(crate) selector: ProjectSelector,
    report: MigrationReport,
}

impl Store {
    /// Opens (creating or upgrading as needed) the store in `config.data_dir`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let opened = open_db(config.database_path()).during(StorageOp::Open)?;
        let selector = ProjectSelector::new(FileSlot::new(config.selector_path()));
        Ok(Self::from_parts(opened, selector))
    }

    /// Opens a private in-memory store with an in-memory selector.
    pub fn open_in_memory() -> StoreResult<Self> {
        let opened = open_db_in_memory().during(StorageOp::Open)?;
        Ok(Self::from_parts(opened, ProjectSelector::in_memory()))
    }

    /// Wraps an already migrated connection.
    ///
    /// When the bootstrap adopted a legacy project and nothing is selected
    /// yet, that project becomes the current one.
    pub fn from_parts(opened: OpenedDb, selector: ProjectSelector) -> Self {
        let OpenedDb { conn, report } = opened;
        if let Some(adopted) = report.adopted_project_id.as_deref() {
            if !selector.has_selection() {
                selector.set(adopted);
            }
        }
        info!(
            "event=store_open module=store status=ok from_version={} to_version={} migrated={}",
            report.from_version,
            report.to_version,
            !report.is_noop()
        );
        Self {
            conn,
            selector,
            report,
        }
    }

    /// Closes the underlying connection, reporting flush failures.
    pub fn close(self) -> StoreResult<()> {
        self.conn
            .close()
            .map_err(|(_, err)| err)
            .during(StorageOp::Write)
    }

    /// What the schema bootstrap did when this store was opened.
    pub fn migration_report(&self) -> &MigrationReport {
        &self.report
    }

    /// Read access to the underlying connection for diagnostics.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn current_project_id(&self) -> ProjectId {
        self.selector.get()
    }

    pub fn select_project(&self, id: &str) {
        self.selector.set(id);
    }

    /// Resolves an explicit scope or falls back to the current project.
    fn scope(&self, project_id: Option<&str>) -> ProjectId {
        match project_id {
            Some(id) => id.to_string(),
            None => self.selector.get(),
        }
    }
}
