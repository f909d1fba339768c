//! Idea repository contracts and SQLite implementation.

use crate::model::idea::{Idea, IdeaPatch};
use crate::model::idea_type::IdeaType;
use crate::repo::{decode_extra, encode_extra, require_scope, RepoResult};
use rusqlite::{params, Connection, Row};

const IDEA_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    type,
    title,
    body,
    extra_json,
    created_at,
    updated_at
FROM ideas";

/// Repository interface for idea cards.
pub trait IdeaRepository {
    fn insert_idea(&self, idea: &Idea) -> RepoResult<()>;
    fn get_idea(&self, id: &str) -> RepoResult<Option<Idea>>;
    /// Lists ideas of one project, newest first.
    fn list_ideas(&self, project_id: &str) -> RepoResult<Vec<Idea>>;
    fn list_all_ideas(&self) -> RepoResult<Vec<Idea>>;
    /// Merges present patch fields and stamps `updated_at`.
    ///
    /// Returns whether a row matched.
    fn update_idea(&self, id: &str, patch: &IdeaPatch, updated_at: i64) -> RepoResult<bool>;
    fn delete_idea(&self, id: &str) -> RepoResult<bool>;
    fn clear_ideas(&self) -> RepoResult<()>;
}

pub struct SqliteIdeaRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIdeaRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, project_id: Option<&str>) -> RepoResult<Vec<Idea>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match project_id {
            Some(project_id) => stmt.query([project_id])?,
            None => stmt.query([])?,
        };
        let mut ideas = Vec::new();
        while let Some(row) = rows.next()? {
            ideas.push(parse_idea_row(row)?);
        }
        Ok(ideas)
    }
}

impl IdeaRepository for SqliteIdeaRepository<'_> {
    fn insert_idea(&self, idea: &Idea) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO ideas (
                id,
                project_id,
                type,
                title,
                body,
                extra_json,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                idea.id,
                idea.project_id,
                idea.kind.as_str(),
                idea.title,
                idea.body,
                encode_extra(&idea.extra)?,
                idea.created_at,
                idea.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_idea(&self, id: &str) -> RepoResult<Option<Idea>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{IDEA_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_idea_row(row)?));
        }
        Ok(None)
    }

    fn list_ideas(&self, project_id: &str) -> RepoResult<Vec<Idea>> {
        self.query(
            &format!(
                "{IDEA_SELECT_SQL} WHERE project_id = ?1 ORDER BY created_at DESC, rowid DESC;"
            ),
            Some(project_id),
        )
    }

    fn list_all_ideas(&self) -> RepoResult<Vec<Idea>> {
        self.query(&format!("{IDEA_SELECT_SQL} ORDER BY rowid ASC;"), None)
    }

    fn update_idea(&self, id: &str, patch: &IdeaPatch, updated_at: i64) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE ideas
             SET
                project_id = COALESCE(?2, project_id),
                type = COALESCE(?3, type),
                title = COALESCE(?4, title),
                body = COALESCE(?5, body),
                updated_at = ?6
             WHERE id = ?1;",
            params![
                id,
                patch.project_id,
                patch.kind.as_ref().map(IdeaType::as_str),
                patch.title,
                patch.body,
                updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_idea(&self, id: &str) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM ideas WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn clear_ideas(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM ideas;", [])?;
        Ok(())
    }
}

fn parse_idea_row(row: &Row<'_>) -> RepoResult<Idea> {
    let id: String = row.get("id")?;
    let project_id = require_scope(row.get("project_id")?, "ideas", "project_id", &id)?;
    let kind: String = row.get("type")?;
    let extra_json: String = row.get("extra_json")?;
    let extra = decode_extra(&extra_json, "ideas", &id)?;
    Ok(Idea {
        project_id,
        kind: IdeaType::from(kind),
        title: row.get("title")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        extra,
        id,
    })
}
