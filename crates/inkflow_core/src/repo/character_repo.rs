//! Character repository contracts and SQLite implementation.

use crate::model::character::{Character, CharacterPatch};
use crate::repo::{decode_extra, encode_extra, require_scope, RepoResult};
use rusqlite::{params, Connection, Row};

const CHARACTER_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    name,
    one_sentence,
    extra_json,
    created_at,
    updated_at
FROM characters";

pub trait CharacterRepository {
    fn insert_character(&self, character: &Character) -> RepoResult<()>;
    fn get_character(&self, id: &str) -> RepoResult<Option<Character>>;
    /// Lists characters of one project in creation order.
    fn list_characters(&self, project_id: &str) -> RepoResult<Vec<Character>>;
    fn list_all_characters(&self) -> RepoResult<Vec<Character>>;
    fn update_character(
        &self,
        id: &str,
        patch: &CharacterPatch,
        updated_at: i64,
    ) -> RepoResult<bool>;
    fn delete_character(&self, id: &str) -> RepoResult<bool>;
    fn clear_characters(&self) -> RepoResult<()>;
}

pub struct SqliteCharacterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCharacterRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CharacterRepository for SqliteCharacterRepository<'_> {
    fn insert_character(&self, character: &Character) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO characters (
                id,
                project_id,
                name,
                one_sentence,
                extra_json,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                character.id,
                character.project_id,
                character.name,
                character.one_sentence,
                encode_extra(&character.extra)?,
                character.created_at,
                character.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_character(&self, id: &str) -> RepoResult<Option<Character>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHARACTER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_character_row(row)?));
        }
        Ok(None)
    }

    fn list_characters(&self, project_id: &str) -> RepoResult<Vec<Character>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHARACTER_SELECT_SQL} WHERE project_id = ?1 ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut characters = Vec::new();
        while let Some(row) = rows.next()? {
            characters.push(parse_character_row(row)?);
        }
        Ok(characters)
    }

    fn list_all_characters(&self) -> RepoResult<Vec<Character>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHARACTER_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut characters = Vec::new();
        while let Some(row) = rows.next()? {
            characters.push(parse_character_row(row)?);
        }
        Ok(characters)
    }

    fn update_character(
        &self,
        id: &str,
        patch: &CharacterPatch,
        updated_at: i64,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE characters
             SET
                project_id = COALESCE(?2, project_id),
                name = COALESCE(?3, name),
                one_sentence = COALESCE(?4, one_sentence),
                updated_at = ?5
             WHERE id = ?1;",
            params![
                id,
                patch.project_id,
                patch.name,
                patch.one_sentence,
                updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_character(&self, id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM characters WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn clear_characters(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM characters;", [])?;
        Ok(())
    }
}

fn parse_character_row(row: &Row<'_>) -> RepoResult<Character> {
    let id: String = row.get("id")?;
    let project_id = require_scope(row.get("project_id")?, "characters", "project_id", &id)?;
    let extra_json: String = row.get("extra_json")?;
    let extra = decode_extra(&extra_json, "characters", &id)?;
    Ok(Character {
        project_id,
        name: row.get("name")?,
        one_sentence: row.get("one_sentence")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        extra,
        id,
    })
}
