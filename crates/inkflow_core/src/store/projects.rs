//! Project operations of the store facade.

use super::Store;
use crate::clock::now_ms;
use crate::error::{StorageContext, StorageOp, StoreResult};
use crate::model::new_record_id;
use crate::model::project::{Project, ProjectDraft, DEFAULT_PROJECT_ID};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use log::info;

impl Store {
    /// Lists projects, most recently updated first.
    ///
    /// An empty store gets a default project, which is selected and returned
    /// alone.
    pub fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let repo = SqliteProjectRepository::new(&self.conn);
        let projects = repo.list_projects().during(StorageOp::LoadProjects)?;
        if !projects.is_empty() {
            return Ok(projects);
        }

        let project = Project::empty(DEFAULT_PROJECT_ID, now_ms());
        repo.insert_project(&project)
            .during(StorageOp::LoadProjects)?;
        self.selector.set(&project.id);
        info!(
            "event=project_default_created module=store status=ok project_id={}",
            project.id
        );
        Ok(vec![project])
    }

    /// Resolves the project the selector points at.
    ///
    /// Falls back to the legacy singleton row for the default id, then to the
    /// most recently updated project (which becomes selected).
    pub fn get_current_project(&self) -> StoreResult<Option<Project>> {
        let id = self.selector.get();
        let repo = SqliteProjectRepository::new(&self.conn);
        if let Some(project) = repo.get_project(&id).during(StorageOp::LoadProject)? {
            return Ok(Some(project));
        }

        if id == DEFAULT_PROJECT_ID {
            if let Some(legacy) = repo.legacy_story(now_ms()).during(StorageOp::LoadProject)? {
                repo.upsert_project(&legacy)
                    .during(StorageOp::LoadProject)?;
                info!(
                    "event=legacy_story_restored module=store status=ok project_id={}",
                    legacy.id
                );
                return Ok(Some(legacy));
            }
        }

        let fallback = self.list_projects()?.into_iter().next();
        if let Some(project) = &fallback {
            self.selector.set(&project.id);
        }
        Ok(fallback)
    }

    pub fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        SqliteProjectRepository::new(&self.conn)
            .get_project(id)
            .during(StorageOp::LoadProject)
    }

    /// Upserts the project named by `draft.id` (default: the current one).
    ///
    /// Keeps `created_at` and unknown fields of an existing row and refreshes
    /// `updated_at`.
    pub fn save_project(&self, draft: &ProjectDraft) -> StoreResult<Project> {
        let id = draft
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| self.selector.get());
        let repo = SqliteProjectRepository::new(&self.conn);
        let existing = repo.get_project(&id).during(StorageOp::SaveProject)?;

        let updated_at = now_ms();
        let mut project = Project::from_draft(id, draft, updated_at, updated_at);
        if let Some(existing) = existing {
            project.created_at = existing.created_at;
            project.extra = existing.extra;
        }
        repo.upsert_project(&project)
            .during(StorageOp::SaveProject)?;
        Ok(project)
    }

    /// Inserts a new project under a fresh id; `draft.id` is ignored.
    pub fn create_project(&self, draft: &ProjectDraft) -> StoreResult<Project> {
        let now = now_ms();
        let project = Project::from_draft(new_record_id(), draft, now, now);
        SqliteProjectRepository::new(&self.conn)
            .insert_project(&project)
            .during(StorageOp::SaveProject)?;
        info!(
            "event=project_create module=store status=ok project_id={}",
            project.id
        );
        Ok(project)
    }

    /// Deletes one project row. Its ideas, characters and chapters stay.
    pub fn delete_project(&self, id: &str) -> StoreResult<()> {
        SqliteProjectRepository::new(&self.conn)
            .delete_project(id)
            .during(StorageOp::Write)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::model::project::ProjectDraft;
    use crate::store::Store;

    #[test]
    fn fresh_store_starts_with_default_project_selected() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.current_project_id(), "story");
        let projects = store.list_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "story");
    }

    #[test]
    fn save_keeps_created_at_and_refreshes_fields() {
        let store = Store::open_in_memory().unwrap();
        let first = store
            .save_project(&ProjectDraft {
                one_sentence: "A courier loses the last map.".to_string(),
                ..ProjectDraft::default()
            })
            .unwrap();
        let second = store
            .save_project(&ProjectDraft {
                setup: "The archive burns.".to_string(),
                ..first.to_draft()
            })
            .unwrap();

        assert_eq!(second.id, "story");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.one_sentence, "A courier loses the last map.");
        assert_eq!(second.setup, "The archive burns.");
    }
}
