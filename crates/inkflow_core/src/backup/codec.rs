//! Export and import of the whole store.
//!
//! # Invariants
//! - Export reads every collection inside one read transaction.
//! - Import validates before touching the database, replaces all collections
//!   inside one write transaction, and moves the selector only after commit.

use super::{validate, BackupDocument, ImportPlan, BACKUP_VERSION};
use crate::clock::now_iso8601;
use crate::error::{StorageContext, StorageOp, StoreError, StoreResult, ValidationError};
use crate::model::project::ProjectId;
use crate::repo::character_repo::{CharacterRepository, SqliteCharacterRepository};
use crate::repo::idea_repo::{IdeaRepository, SqliteIdeaRepository};
use crate::repo::idea_type_repo::{IdeaTypeRepository, SqliteIdeaTypeRepository};
use crate::repo::outline_repo::{
    ChapterRepository, SceneRepository, SqliteChapterRepository, SqliteSceneRepository,
};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::RepoResult;
use crate::store::Store;
use log::{error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde_json::Value;
use std::time::Instant;

/// What an import wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Project selected after the import, when the document named one.
    pub selected_project_id: Option<ProjectId>,
    pub projects: usize,
    pub ideas: usize,
    pub characters: usize,
    pub chapters: usize,
    pub scenes: usize,
    /// Whether the custom idea type catalogue was replaced.
    pub replaced_custom_idea_types: bool,
}

impl Store {
    /// Snapshots every collection into a backup document.
    pub fn export(&self) -> StoreResult<BackupDocument> {
        let started_at = Instant::now();
        let document = read_snapshot(&self.conn).during(StorageOp::Export);
        match &document {
            Ok(document) => info!(
                "event=backup_export module=backup status=ok duration_ms={} projects={} ideas={} characters={} chapters={} scenes={}",
                started_at.elapsed().as_millis(),
                document.stories.len(),
                document.ideas.len(),
                document.characters.len(),
                document.chapters.len(),
                document.scenes.len()
            ),
            Err(err) => error!(
                "event=backup_export module=backup status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        document
    }

    /// Parses `text` as JSON and imports it.
    ///
    /// Text that is not JSON is reported as a validation error.
    pub fn import_str(&self, text: &str) -> StoreResult<ImportSummary> {
        let data: Value = serde_json::from_str(text)
            .map_err(|err| ValidationError::Malformed(err.to_string()))?;
        self.import(&data)
    }

    /// Replaces the whole store with the contents of `data`.
    ///
    /// # Errors
    /// - `StoreError::Validation` when `data` is not a usable backup; nothing
    ///   is written.
    /// - `StoreError::Storage` (op `Import`) when a record cannot be decoded
    ///   or written; the transaction is rolled back.
    pub fn import(&self, data: &Value) -> StoreResult<ImportSummary> {
        let started_at = Instant::now();
        if let Err(err) = validate(data) {
            info!(
                "event=backup_import module=backup status=rejected error_code={}",
                err.hint_key()
            );
            return Err(StoreError::Validation(err));
        }

        let outcome = ImportPlan::from_document(data)
            .and_then(|plan| write_plan(&self.conn, &plan).map(|()| plan))
            .during(StorageOp::Import);
        let plan = match outcome {
            Ok(plan) => plan,
            Err(err) => {
                error!(
                    "event=backup_import module=backup status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
        };

        if let Some(selected) = plan.selected.as_deref() {
            self.selector.set(selected);
        }

        let summary = ImportSummary {
            selected_project_id: plan.selected,
            projects: plan.projects.len(),
            ideas: plan.ideas.len(),
            characters: plan.characters.len(),
            chapters: plan.chapters.len(),
            scenes: plan.scenes.len(),
            replaced_custom_idea_types: plan.custom_idea_types.is_some(),
        };
        info!(
            "event=backup_import module=backup status=ok duration_ms={} projects={} ideas={} characters={} chapters={} scenes={}",
            started_at.elapsed().as_millis(),
            summary.projects,
            summary.ideas,
            summary.characters,
            summary.chapters,
            summary.scenes
        );
        Ok(summary)
    }
}

fn read_snapshot(conn: &Connection) -> RepoResult<BackupDocument> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let document = BackupDocument {
        version: BACKUP_VERSION,
        exported_at: now_iso8601(),
        stories: SqliteProjectRepository::new(&tx).list_all_projects()?,
        ideas: SqliteIdeaRepository::new(&tx).list_all_ideas()?,
        characters: SqliteCharacterRepository::new(&tx).list_all_characters()?,
        chapters: SqliteChapterRepository::new(&tx).list_all_chapters()?,
        scenes: SqliteSceneRepository::new(&tx).list_all_scenes()?,
        custom_idea_types: SqliteIdeaTypeRepository::new(&tx).list_custom_types()?,
    };
    tx.commit()?;
    Ok(document)
}

fn write_plan(conn: &Connection, plan: &ImportPlan) -> RepoResult<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let projects = SqliteProjectRepository::new(&tx);
    let ideas = SqliteIdeaRepository::new(&tx);
    let characters = SqliteCharacterRepository::new(&tx);
    let chapters = SqliteChapterRepository::new(&tx);
    let scenes = SqliteSceneRepository::new(&tx);

    scenes.clear_scenes()?;
    chapters.clear_chapters()?;
    characters.clear_characters()?;
    ideas.clear_ideas()?;
    projects.clear_projects()?;

    for project in &plan.projects {
        projects.insert_project(project)?;
    }
    for idea in &plan.ideas {
        ideas.insert_idea(idea)?;
    }
    for character in &plan.characters {
        characters.insert_character(character)?;
    }
    for chapter in &plan.chapters {
        chapters.insert_chapter(chapter)?;
    }
    for scene in &plan.scenes {
        scenes.insert_scene(scene)?;
    }

    if let Some(custom_types) = &plan.custom_idea_types {
        let catalogue = SqliteIdeaTypeRepository::new(&tx);
        catalogue.clear_custom_types()?;
        for custom in custom_types {
            catalogue.insert_custom_type(custom)?;
        }
    }

    tx.commit()?;
    Ok(())
}
