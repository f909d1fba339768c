//! Project (story spine) record.
//!
//! A project is the top-level scoping unit: ideas, characters and chapters
//! point at it through `project_id`. Its narrative fields follow the
//! snowflake-style spine: one sentence, setup, three disasters, ending.

use crate::clock::now_ms;
use crate::model::{null_as_default, null_as_now};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type ProjectId = String;

/// Id of the implicit single project of schema v1, also used for the
/// synthesized project of an empty store.
pub const DEFAULT_PROJECT_ID: &str = "story";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Blank ids from legacy documents are replaced by the caller.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: ProjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub one_sentence: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub setup: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disaster1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disaster2: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disaster3: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ending: String,
    #[serde(default = "now_ms", deserialize_with = "null_as_now")]
    pub created_at: i64,
    #[serde(default = "now_ms", deserialize_with = "null_as_now")]
    pub updated_at: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    /// Creates a project with empty narrative fields stamped at `now`.
    pub fn empty(id: impl Into<ProjectId>, now: i64) -> Self {
        Self::from_draft(id, &ProjectDraft::default(), now, now)
    }

    /// Builds a project from draft fields and explicit timestamps.
    pub fn from_draft(
        id: impl Into<ProjectId>,
        draft: &ProjectDraft,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            one_sentence: draft.one_sentence.clone(),
            setup: draft.setup.clone(),
            disaster1: draft.disaster1.clone(),
            disaster2: draft.disaster2.clone(),
            disaster3: draft.disaster3.clone(),
            ending: draft.ending.clone(),
            created_at,
            updated_at,
            extra: Map::new(),
        }
    }

    /// Returns the editable narrative fields as a draft.
    pub fn to_draft(&self) -> ProjectDraft {
        ProjectDraft {
            id: Some(self.id.clone()),
            one_sentence: self.one_sentence.clone(),
            setup: self.setup.clone(),
            disaster1: self.disaster1.clone(),
            disaster2: self.disaster2.clone(),
            disaster3: self.disaster3.clone(),
            ending: self.ending.clone(),
        }
    }
}

/// Editable project fields used by save and create.
///
/// Fields left at their default are stored as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    /// Target id for `save_project`; ignored by `create_project`.
    pub id: Option<ProjectId>,
    pub one_sentence: String,
    pub setup: String,
    pub disaster1: String,
    pub disaster2: String,
    pub disaster3: String,
    pub ending: String,
}

#[cfg(test)]
mod tests {
    use super::Project;
    use serde_json::json;

    #[test]
    fn legacy_json_with_nulls_and_missing_fields_decodes() {
        let project: Project = serde_json::from_value(json!({
            "id": "story",
            "oneSentence": "A thief steals the moon.",
            "setup": null,
            "updatedAt": 1700000000000_i64
        }))
        .unwrap();

        assert_eq!(project.id, "story");
        assert_eq!(project.one_sentence, "A thief steals the moon.");
        assert_eq!(project.setup, "");
        assert_eq!(project.updated_at, 1_700_000_000_000);
        assert!(project.created_at > 0);
        assert!(project.extra.is_empty());
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let value = json!({
            "id": "p1",
            "oneSentence": "",
            "setup": "",
            "disaster1": "",
            "disaster2": "",
            "disaster3": "",
            "ending": "",
            "createdAt": 1,
            "updatedAt": 2,
            "genre": "noir"
        });
        let project: Project = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(project.extra.get("genre"), Some(&json!("noir")));
        assert_eq!(serde_json::to_value(&project).unwrap(), value);
    }
}
