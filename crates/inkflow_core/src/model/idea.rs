//! Idea card record.

use crate::clock::now_ms;
use crate::model::idea_type::IdeaType;
use crate::model::project::ProjectId;
use crate::model::{null_as_default, null_as_now};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type IdeaId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: IdeaId,
    /// Older exports name this field `storyId`.
    #[serde(alias = "storyId")]
    pub project_id: ProjectId,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: IdeaType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default = "now_ms", deserialize_with = "null_as_now")]
    pub created_at: i64,
    /// Unset until the first update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload for `add_idea`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIdea {
    /// Defaults to the current project.
    pub project_id: Option<ProjectId>,
    pub kind: IdeaType,
    pub title: String,
    pub body: String,
}

/// Partial update for one idea; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdeaPatch {
    pub project_id: Option<ProjectId>,
    pub kind: Option<IdeaType>,
    pub title: Option<String>,
    pub body: Option<String>,
}
