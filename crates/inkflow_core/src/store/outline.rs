//! Chapter, scene and outline operations of the store facade.
//!
//! `order` is allocated from the current count in scope, so a delete followed
//! by an insert can repeat an existing value.

use super::Store;
use crate::clock::now_ms;
use crate::error::{StorageContext, StorageOp, StoreResult};
use crate::model::new_record_id;
use crate::model::outline::{
    Chapter, ChapterPatch, NewChapter, NewScene, Outline, Scene, ScenePatch,
};
use crate::repo::outline_repo::{
    ChapterRepository, SceneRepository, SqliteChapterRepository, SqliteSceneRepository,
};
use log::info;
use serde_json::Map;

impl Store {
    /// Lists chapters of `project_id` (default: current project) by `order`.
    pub fn list_chapters(&self, project_id: Option<&str>) -> StoreResult<Vec<Chapter>> {
        let scope = self.scope(project_id);
        SqliteChapterRepository::new(&self.conn)
            .list_chapters(&scope)
            .during(StorageOp::Read)
    }

    pub fn add_chapter(&self, new: NewChapter) -> StoreResult<Chapter> {
        let repo = SqliteChapterRepository::new(&self.conn);
        let project_id = self.scope(new.project_id.as_deref());
        let order = match new.order {
            Some(order) => order,
            None => repo
                .count_chapters(&project_id)
                .during(StorageOp::Write)?,
        };
        let chapter = Chapter {
            id: new_record_id(),
            project_id,
            title: new.title,
            order,
            created_at: now_ms(),
            updated_at: None,
            extra: Map::new(),
        };
        repo.insert_chapter(&chapter).during(StorageOp::Write)?;
        Ok(chapter)
    }

    pub fn update_chapter(&self, id: &str, patch: &ChapterPatch) -> StoreResult<Option<Chapter>> {
        let repo = SqliteChapterRepository::new(&self.conn);
        if !repo
            .update_chapter(id, patch, now_ms())
            .during(StorageOp::Write)?
        {
            return Ok(None);
        }
        repo.get_chapter(id).during(StorageOp::Write)
    }

    /// Deletes the chapter and its scenes in one transaction.
    pub fn delete_chapter(&self, id: &str) -> StoreResult<()> {
        let scenes_removed = SqliteChapterRepository::new(&self.conn)
            .delete_chapter_cascade(id)
            .during(StorageOp::Write)?;
        info!(
            "event=chapter_delete module=store status=ok chapter_id={} scenes_removed={}",
            id, scenes_removed
        );
        Ok(())
    }

    /// Lists scenes whose chapter belongs to `project_id`, or every scene
    /// when `None`, sorted by chapter id then `order`.
    pub fn list_scenes(&self, project_id: Option<&str>) -> StoreResult<Vec<Scene>> {
        SqliteSceneRepository::new(&self.conn)
            .list_scenes(project_id)
            .during(StorageOp::Read)
    }

    pub fn get_scene(&self, id: &str) -> StoreResult<Option<Scene>> {
        SqliteSceneRepository::new(&self.conn)
            .get_scene(id)
            .during(StorageOp::Read)
    }

    pub fn list_scenes_by_chapter(&self, chapter_id: &str) -> StoreResult<Vec<Scene>> {
        SqliteSceneRepository::new(&self.conn)
            .list_scenes_by_chapter(chapter_id)
            .during(StorageOp::Read)
    }

    pub fn add_scene(&self, new: NewScene) -> StoreResult<Scene> {
        let repo = SqliteSceneRepository::new(&self.conn);
        let order = match new.order {
            Some(order) => order,
            None => repo
                .count_scenes(&new.chapter_id)
                .during(StorageOp::SaveScene)?,
        };
        let scene = Scene {
            id: new_record_id(),
            chapter_id: new.chapter_id,
            title: new.title,
            order,
            content: new.content,
            created_at: now_ms(),
            updated_at: None,
            extra: Map::new(),
        };
        repo.insert_scene(&scene).during(StorageOp::SaveScene)?;
        Ok(scene)
    }

    pub fn update_scene(&self, id: &str, patch: &ScenePatch) -> StoreResult<Option<Scene>> {
        let repo = SqliteSceneRepository::new(&self.conn);
        if !repo
            .update_scene(id, patch, now_ms())
            .during(StorageOp::SaveScene)?
        {
            return Ok(None);
        }
        repo.get_scene(id).during(StorageOp::SaveScene)
    }

    pub fn delete_scene(&self, id: &str) -> StoreResult<()> {
        SqliteSceneRepository::new(&self.conn)
            .delete_scene(id)
            .during(StorageOp::Write)?;
        Ok(())
    }

    /// Chapters of `project_id` (default: current project) with their scenes,
    /// both in display order.
    pub fn load_outline(&self, project_id: Option<&str>) -> StoreResult<Outline> {
        let scope = self.scope(project_id);
        let chapters = self.list_chapters(Some(&scope))?;
        let scenes = self.list_scenes(Some(&scope))?;
        Ok(Outline::assemble(chapters, scenes))
    }
}
