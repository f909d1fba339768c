//! Chapter and scene records plus the assembled outline view.
//!
//! # Invariants
//! - `order` is a display hint allocated from the current count in scope; it
//!   is not unique after deletions and must never be used as a key.
//! - Scenes are scoped by `chapter_id` only; their project is the chapter's.

use crate::clock::now_ms;
use crate::model::project::ProjectId;
use crate::model::{null_as_default, null_as_now};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type ChapterId = String;
pub type SceneId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(alias = "storyId")]
    pub project_id: ProjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i64,
    #[serde(default = "now_ms", deserialize_with = "null_as_now")]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    pub chapter_id: ChapterId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default = "now_ms", deserialize_with = "null_as_now")]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewChapter {
    pub project_id: Option<ProjectId>,
    pub title: String,
    /// Defaults to the number of chapters already in the project.
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterPatch {
    pub project_id: Option<ProjectId>,
    pub title: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewScene {
    pub chapter_id: ChapterId,
    pub title: String,
    /// Defaults to the number of scenes already in the chapter.
    pub order: Option<i64>,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenePatch {
    pub chapter_id: Option<ChapterId>,
    pub title: Option<String>,
    pub order: Option<i64>,
    pub content: Option<String>,
}

/// One chapter with its scenes in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineChapter {
    pub chapter: Chapter,
    pub scenes: Vec<Scene>,
}

/// Chapters of one project in display order, each with its scenes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub chapters: Vec<OutlineChapter>,
}

impl Outline {
    /// Groups `scenes` under `chapters`, keeping the given orders.
    ///
    /// Scenes whose chapter is not in `chapters` are dropped.
    pub fn assemble(chapters: Vec<Chapter>, scenes: Vec<Scene>) -> Self {
        let mut outline = Self {
            chapters: chapters
                .into_iter()
                .map(|chapter| OutlineChapter {
                    chapter,
                    scenes: Vec::new(),
                })
                .collect(),
        };
        for scene in scenes {
            if let Some(slot) = outline
                .chapters
                .iter_mut()
                .find(|entry| entry.chapter.id == scene.chapter_id)
            {
                slot.scenes.push(scene);
            }
        }
        for entry in &mut outline.chapters {
            entry.scenes.sort_by_key(|scene| scene.order);
        }
        outline
    }

    pub fn scene_count(&self) -> usize {
        self.chapters.iter().map(|entry| entry.scenes.len()).sum()
    }
}
