//! Custom idea type catalogue repository.
//!
//! # Invariants
//! - Names are unique case-insensitively. `find_custom_type` folds full
//!   Unicode case; the `COLLATE NOCASE` column only covers ASCII.
//! - Listing follows creation order.

use crate::model::idea_type::CustomIdeaType;
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

pub trait IdeaTypeRepository {
    fn insert_custom_type(&self, custom: &CustomIdeaType) -> RepoResult<()>;
    fn find_custom_type(&self, name: &str) -> RepoResult<Option<CustomIdeaType>>;
    fn list_custom_types(&self) -> RepoResult<Vec<CustomIdeaType>>;
    fn clear_custom_types(&self) -> RepoResult<()>;
}

pub struct SqliteIdeaTypeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIdeaTypeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl IdeaTypeRepository for SqliteIdeaTypeRepository<'_> {
    fn insert_custom_type(&self, custom: &CustomIdeaType) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO custom_idea_types (id, name, created_at) VALUES (?1, ?2, ?3);",
            params![custom.id, custom.name, custom.created_at],
        )?;
        Ok(())
    }

    fn find_custom_type(&self, name: &str) -> RepoResult<Option<CustomIdeaType>> {
        // NOCASE only folds ASCII.
        let wanted = name.to_lowercase();
        let found = self
            .list_custom_types()?
            .into_iter()
            .find(|custom| custom.name.to_lowercase() == wanted);
        Ok(found)
    }

    fn list_custom_types(&self) -> RepoResult<Vec<CustomIdeaType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, created_at
             FROM custom_idea_types
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            types.push(CustomIdeaType {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            });
        }
        Ok(types)
    }

    fn clear_custom_types(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM custom_idea_types;", [])?;
        Ok(())
    }
}
