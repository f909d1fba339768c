//! Idea, character and custom idea type operations of the store facade.

use super::Store;
use crate::clock::now_ms;
use crate::error::{StorageContext, StorageOp, StoreResult};
use crate::model::character::{Character, CharacterPatch, NewCharacter};
use crate::model::idea::{Idea, IdeaPatch, NewIdea};
use crate::model::idea_type::{normalize_custom_type_name, BuiltInIdeaType, CustomIdeaType};
use crate::model::new_record_id;
use crate::repo::character_repo::{CharacterRepository, SqliteCharacterRepository};
use crate::repo::idea_repo::{IdeaRepository, SqliteIdeaRepository};
use crate::repo::idea_type_repo::{IdeaTypeRepository, SqliteIdeaTypeRepository};
use serde_json::Map;

impl Store {
    /// Lists ideas of `project_id` (default: current project), newest first.
    pub fn list_ideas(&self, project_id: Option<&str>) -> StoreResult<Vec<Idea>> {
        let scope = self.scope(project_id);
        SqliteIdeaRepository::new(&self.conn)
            .list_ideas(&scope)
            .during(StorageOp::Read)
    }

    pub fn add_idea(&self, new: NewIdea) -> StoreResult<Idea> {
        let idea = Idea {
            id: new_record_id(),
            project_id: self.scope(new.project_id.as_deref()),
            kind: new.kind,
            title: new.title,
            body: new.body,
            created_at: now_ms(),
            updated_at: None,
            extra: Map::new(),
        };
        SqliteIdeaRepository::new(&self.conn)
            .insert_idea(&idea)
            .during(StorageOp::Write)?;
        Ok(idea)
    }

    /// Merges `patch` into the idea; `None` when no idea has this id.
    pub fn update_idea(&self, id: &str, patch: &IdeaPatch) -> StoreResult<Option<Idea>> {
        let repo = SqliteIdeaRepository::new(&self.conn);
        if !repo
            .update_idea(id, patch, now_ms())
            .during(StorageOp::Write)?
        {
            return Ok(None);
        }
        repo.get_idea(id).during(StorageOp::Write)
    }

    pub fn delete_idea(&self, id: &str) -> StoreResult<()> {
        SqliteIdeaRepository::new(&self.conn)
            .delete_idea(id)
            .during(StorageOp::Write)?;
        Ok(())
    }

    /// Lists characters of `project_id` (default: current project) in
    /// creation order.
    pub fn list_characters(&self, project_id: Option<&str>) -> StoreResult<Vec<Character>> {
        let scope = self.scope(project_id);
        SqliteCharacterRepository::new(&self.conn)
            .list_characters(&scope)
            .during(StorageOp::Read)
    }

    pub fn add_character(&self, new: NewCharacter) -> StoreResult<Character> {
        let character = Character {
            id: new_record_id(),
            project_id: self.scope(new.project_id.as_deref()),
            name: new.name,
            one_sentence: new.one_sentence,
            created_at: now_ms(),
            updated_at: None,
            extra: Map::new(),
        };
        SqliteCharacterRepository::new(&self.conn)
            .insert_character(&character)
            .during(StorageOp::Write)?;
        Ok(character)
    }

    pub fn update_character(
        &self,
        id: &str,
        patch: &CharacterPatch,
    ) -> StoreResult<Option<Character>> {
        let repo = SqliteCharacterRepository::new(&self.conn);
        if !repo
            .update_character(id, patch, now_ms())
            .during(StorageOp::Write)?
        {
            return Ok(None);
        }
        repo.get_character(id).during(StorageOp::Write)
    }

    pub fn delete_character(&self, id: &str) -> StoreResult<()> {
        SqliteCharacterRepository::new(&self.conn)
            .delete_character(id)
            .during(StorageOp::Write)?;
        Ok(())
    }

    pub fn list_custom_idea_types(&self) -> StoreResult<Vec<CustomIdeaType>> {
        SqliteIdeaTypeRepository::new(&self.conn)
            .list_custom_types()
            .during(StorageOp::Read)
    }

    /// Adds a user-defined idea type.
    ///
    /// Returns `None` for blank names, built-in slugs and names already in the
    /// catalogue (compared case-insensitively).
    pub fn add_custom_idea_type(&self, name: &str) -> StoreResult<Option<CustomIdeaType>> {
        let Some(name) = normalize_custom_type_name(name) else {
            return Ok(None);
        };
        if BuiltInIdeaType::from_slug(&name.to_lowercase()).is_some() {
            return Ok(None);
        }

        let repo = SqliteIdeaTypeRepository::new(&self.conn);
        if repo
            .find_custom_type(&name)
            .during(StorageOp::Write)?
            .is_some()
        {
            return Ok(None);
        }

        let custom = CustomIdeaType {
            id: new_record_id(),
            name,
            created_at: now_ms(),
        };
        repo.insert_custom_type(&custom)
            .during(StorageOp::Write)?;
        Ok(Some(custom))
    }
}
