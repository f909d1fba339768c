//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist project rows and expose the legacy singleton `story` row.
//!
//! # Invariants
//! - Project listing is sorted by `updated_at DESC`, newest insert first on
//!   ties.
//! - Upserts keep the row identity (no delete + insert).

use crate::model::project::{Project, DEFAULT_PROJECT_ID};
use crate::repo::{decode_extra, encode_extra, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    one_sentence,
    setup,
    disaster1,
    disaster2,
    disaster3,
    ending,
    extra_json,
    created_at,
    updated_at
FROM projects";

/// Repository interface for project persistence.
pub trait ProjectRepository {
    /// Inserts one project; fails when the id already exists.
    fn insert_project(&self, project: &Project) -> RepoResult<()>;
    /// Inserts or fully replaces one project by id.
    fn upsert_project(&self, project: &Project) -> RepoResult<()>;
    fn get_project(&self, id: &str) -> RepoResult<Option<Project>>;
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    /// Lists every project in insertion order.
    fn list_all_projects(&self) -> RepoResult<Vec<Project>>;
    /// Deletes one project; returns whether a row was removed.
    fn delete_project(&self, id: &str) -> RepoResult<bool>;
    fn clear_projects(&self) -> RepoResult<()>;
    /// Reads the v1 singleton story row, normalized to a project.
    ///
    /// Missing narrative fields become empty strings and missing timestamps
    /// become `now`.
    fn legacy_story(&self, now: i64) -> RepoResult<Option<Project>>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn insert_project(&self, project: &Project) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO projects (
                id,
                one_sentence,
                setup,
                disaster1,
                disaster2,
                disaster3,
                ending,
                extra_json,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                project.id,
                project.one_sentence,
                project.setup,
                project.disaster1,
                project.disaster2,
                project.disaster3,
                project.ending,
                encode_extra(&project.extra)?,
                project.created_at,
                project.updated_at,
            ],
        )?;
        Ok(())
    }

    fn upsert_project(&self, project: &Project) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO projects (
                id,
                one_sentence,
                setup,
                disaster1,
                disaster2,
                disaster3,
                ending,
                extra_json,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                one_sentence = excluded.one_sentence,
                setup = excluded.setup,
                disaster1 = excluded.disaster1,
                disaster2 = excluded.disaster2,
                disaster3 = excluded.disaster3,
                ending = excluded.ending,
                extra_json = excluded.extra_json,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at;",
            params![
                project.id,
                project.one_sentence,
                project.setup,
                project.disaster1,
                project.disaster2,
                project.disaster3,
                project.ending,
                encode_extra(&project.extra)?,
                project.created_at,
                project.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_project(&self, id: &str) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        query_projects(
            self.conn,
            &format!("{PROJECT_SELECT_SQL} ORDER BY updated_at DESC, rowid DESC;"),
        )
    }

    fn list_all_projects(&self) -> RepoResult<Vec<Project>> {
        query_projects(self.conn, &format!("{PROJECT_SELECT_SQL} ORDER BY rowid ASC;"))
    }

    fn delete_project(&self, id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn clear_projects(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM projects;", [])?;
        Ok(())
    }

    fn legacy_story(&self, now: i64) -> RepoResult<Option<Project>> {
        let legacy = self
            .conn
            .query_row(
                "SELECT
                    id,
                    COALESCE(one_sentence, ''),
                    COALESCE(setup, ''),
                    COALESCE(disaster1, ''),
                    COALESCE(disaster2, ''),
                    COALESCE(disaster3, ''),
                    COALESCE(ending, ''),
                    COALESCE(created_at, ?1),
                    COALESCE(updated_at, ?1)
                 FROM story
                 ORDER BY rowid ASC
                 LIMIT 1;",
                [now],
                |row| {
                    let id: Option<String> = row.get(0)?;
                    Ok(Project {
                        id: id
                            .filter(|value| !value.trim().is_empty())
                            .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string()),
                        one_sentence: row.get(1)?,
                        setup: row.get(2)?,
                        disaster1: row.get(3)?,
                        disaster2: row.get(4)?,
                        disaster3: row.get(5)?,
                        ending: row.get(6)?,
                        created_at: row.get(7)?,
                        updated_at: row.get(8)?,
                        extra: Default::default(),
                    })
                },
            )
            .optional()?;
        Ok(legacy)
    }
}

fn query_projects(conn: &Connection, sql: &str) -> RepoResult<Vec<Project>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut projects = Vec::new();
    while let Some(row) = rows.next()? {
        projects.push(parse_project_row(row)?);
    }
    Ok(projects)
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id: String = row.get("id")?;
    let extra_json: String = row.get("extra_json")?;
    let extra = decode_extra(&extra_json, "projects", &id)?;
    Ok(Project {
        one_sentence: row.get("one_sentence")?,
        setup: row.get("setup")?,
        disaster1: row.get("disaster1")?,
        disaster2: row.get("disaster2")?,
        disaster3: row.get("disaster3")?,
        ending: row.get("ending")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        extra,
        id,
    })
}
