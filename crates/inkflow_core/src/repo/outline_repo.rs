//! Chapter/scene repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist chapters (project-scoped) and scenes (chapter-scoped).
//! - Own count queries used for `order` allocation.
//! - Own the chapter -> scenes cascade delete.
//!
//! # Invariants
//! - Chapter listing is deterministic: `sort_order ASC, rowid ASC`.
//! - Scene listing is `chapter_id ASC, sort_order ASC, rowid ASC`.
//! - Deleting a chapter removes its scenes in the same transaction.

use crate::model::outline::{Chapter, ChapterPatch, Scene, ScenePatch};
use crate::repo::{decode_extra, encode_extra, require_scope, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const CHAPTER_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    title,
    sort_order,
    extra_json,
    created_at,
    updated_at
FROM chapters";

const SCENE_SELECT_SQL: &str = "SELECT
    id,
    chapter_id,
    title,
    sort_order,
    content,
    extra_json,
    created_at,
    updated_at
FROM scenes";

pub trait ChapterRepository {
    fn insert_chapter(&self, chapter: &Chapter) -> RepoResult<()>;
    fn get_chapter(&self, id: &str) -> RepoResult<Option<Chapter>>;
    fn list_chapters(&self, project_id: &str) -> RepoResult<Vec<Chapter>>;
    fn list_all_chapters(&self) -> RepoResult<Vec<Chapter>>;
    fn count_chapters(&self, project_id: &str) -> RepoResult<i64>;
    fn update_chapter(&self, id: &str, patch: &ChapterPatch, updated_at: i64)
        -> RepoResult<bool>;
    /// Deletes the chapter and all of its scenes atomically.
    ///
    /// Returns the number of scenes removed alongside the chapter.
    fn delete_chapter_cascade(&self, id: &str) -> RepoResult<usize>;
    fn clear_chapters(&self) -> RepoResult<()>;
}

pub trait SceneRepository {
    fn insert_scene(&self, scene: &Scene) -> RepoResult<()>;
    fn get_scene(&self, id: &str) -> RepoResult<Option<Scene>>;
    /// Lists scenes whose chapter belongs to `project_id`, or every scene
    /// when `None`.
    fn list_scenes(&self, project_id: Option<&str>) -> RepoResult<Vec<Scene>>;
    fn list_scenes_by_chapter(&self, chapter_id: &str) -> RepoResult<Vec<Scene>>;
    /// Lists every scene in insertion order.
    fn list_all_scenes(&self) -> RepoResult<Vec<Scene>>;
    fn count_scenes(&self, chapter_id: &str) -> RepoResult<i64>;
    fn update_scene(&self, id: &str, patch: &ScenePatch, updated_at: i64) -> RepoResult<bool>;
    fn delete_scene(&self, id: &str) -> RepoResult<bool>;
    fn clear_scenes(&self) -> RepoResult<()>;
}

pub struct SqliteChapterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChapterRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ChapterRepository for SqliteChapterRepository<'_> {
    fn insert_chapter(&self, chapter: &Chapter) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO chapters (
                id,
                project_id,
                title,
                sort_order,
                extra_json,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                chapter.id,
                chapter.project_id,
                chapter.title,
                chapter.order,
                encode_extra(&chapter.extra)?,
                chapter.created_at,
                chapter.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_chapter(&self, id: &str) -> RepoResult<Option<Chapter>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHAPTER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_chapter_row(row)?));
        }
        Ok(None)
    }

    fn list_chapters(&self, project_id: &str) -> RepoResult<Vec<Chapter>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHAPTER_SELECT_SQL} WHERE project_id = ?1 ORDER BY sort_order ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut chapters = Vec::new();
        while let Some(row) = rows.next()? {
            chapters.push(parse_chapter_row(row)?);
        }
        Ok(chapters)
    }

    fn list_all_chapters(&self) -> RepoResult<Vec<Chapter>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHAPTER_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut chapters = Vec::new();
        while let Some(row) = rows.next()? {
            chapters.push(parse_chapter_row(row)?);
        }
        Ok(chapters)
    }

    fn count_chapters(&self, project_id: &str) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM chapters WHERE project_id = ?1;",
            [project_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn update_chapter(
        &self,
        id: &str,
        patch: &ChapterPatch,
        updated_at: i64,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE chapters
             SET
                project_id = COALESCE(?2, project_id),
                title = COALESCE(?3, title),
                sort_order = COALESCE(?4, sort_order),
                updated_at = ?5
             WHERE id = ?1;",
            params![id, patch.project_id, patch.title, patch.order, updated_at],
        )?;
        Ok(changed > 0)
    }

    fn delete_chapter_cascade(&self, id: &str) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let scenes_removed = tx.execute("DELETE FROM scenes WHERE chapter_id = ?1;", [id])?;
        tx.execute("DELETE FROM chapters WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(scenes_removed)
    }

    fn clear_chapters(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM chapters;", [])?;
        Ok(())
    }
}

pub struct SqliteSceneRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSceneRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, scope: Option<&str>) -> RepoResult<Vec<Scene>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match scope {
            Some(scope) => stmt.query([scope])?,
            None => stmt.query([])?,
        };
        let mut scenes = Vec::new();
        while let Some(row) = rows.next()? {
            scenes.push(parse_scene_row(row)?);
        }
        Ok(scenes)
    }
}

impl SceneRepository for SqliteSceneRepository<'_> {
    fn insert_scene(&self, scene: &Scene) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO scenes (
                id,
                chapter_id,
                title,
                sort_order,
                content,
                extra_json,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                scene.id,
                scene.chapter_id,
                scene.title,
                scene.order,
                scene.content,
                encode_extra(&scene.extra)?,
                scene.created_at,
                scene.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_scene(&self, id: &str) -> RepoResult<Option<Scene>> {
        let mut scenes = self.query(&format!("{SCENE_SELECT_SQL} WHERE id = ?1;"), Some(id))?;
        Ok(scenes.pop())
    }

    fn list_scenes(&self, project_id: Option<&str>) -> RepoResult<Vec<Scene>> {
        let sql = match project_id {
            Some(_) => format!(
                "{SCENE_SELECT_SQL}
                 WHERE chapter_id IN (SELECT id FROM chapters WHERE project_id = ?1)
                 ORDER BY chapter_id ASC, sort_order ASC, rowid ASC;"
            ),
            None => {
                format!("{SCENE_SELECT_SQL} ORDER BY chapter_id ASC, sort_order ASC, rowid ASC;")
            }
        };
        self.query(&sql, project_id)
    }

    fn list_scenes_by_chapter(&self, chapter_id: &str) -> RepoResult<Vec<Scene>> {
        self.query(
            &format!(
                "{SCENE_SELECT_SQL} WHERE chapter_id = ?1 ORDER BY sort_order ASC, rowid ASC;"
            ),
            Some(chapter_id),
        )
    }

    fn list_all_scenes(&self) -> RepoResult<Vec<Scene>> {
        self.query(&format!("{SCENE_SELECT_SQL} ORDER BY rowid ASC;"), None)
    }

    fn count_scenes(&self, chapter_id: &str) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM scenes WHERE chapter_id = ?1;",
            [chapter_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn update_scene(&self, id: &str, patch: &ScenePatch, updated_at: i64) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE scenes
             SET
                chapter_id = COALESCE(?2, chapter_id),
                title = COALESCE(?3, title),
                sort_order = COALESCE(?4, sort_order),
                content = COALESCE(?5, content),
                updated_at = ?6
             WHERE id = ?1;",
            params![
                id,
                patch.chapter_id,
                patch.title,
                patch.order,
                patch.content,
                updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_scene(&self, id: &str) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM scenes WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn clear_scenes(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM scenes;", [])?;
        Ok(())
    }
}

fn parse_chapter_row(row: &Row<'_>) -> RepoResult<Chapter> {
    let id: String = row.get("id")?;
    let project_id = require_scope(row.get("project_id")?, "chapters", "project_id", &id)?;
    let extra_json: String = row.get("extra_json")?;
    let extra = decode_extra(&extra_json, "chapters", &id)?;
    Ok(Chapter {
        project_id,
        title: row.get("title")?,
        order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        extra,
        id,
    })
}

fn parse_scene_row(row: &Row<'_>) -> RepoResult<Scene> {
    let id: String = row.get("id")?;
    let extra_json: String = row.get("extra_json")?;
    let extra = decode_extra(&extra_json, "scenes", &id)?;
    Ok(Scene {
        chapter_id: row.get("chapter_id")?,
        title: row.get("title")?,
        order: row.get("sort_order")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        extra,
        id,
    })
}
