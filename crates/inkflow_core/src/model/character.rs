//! Character record.

use crate::clock::now_ms;
use crate::model::project::ProjectId;
use crate::model::{null_as_default, null_as_now};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type CharacterId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    #[serde(alias = "storyId")]
    pub project_id: ProjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// One-sentence summary of the character.
    #[serde(default, deserialize_with = "null_as_default")]
    pub one_sentence: String,
    #[serde(default = "now_ms", deserialize_with = "null_as_now")]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCharacter {
    pub project_id: Option<ProjectId>,
    pub name: String,
    pub one_sentence: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterPatch {
    pub project_id: Option<ProjectId>,
    pub name: Option<String>,
    pub one_sentence: Option<String>,
}
