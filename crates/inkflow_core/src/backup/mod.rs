//! Whole-store backup documents.
//!
//! # Responsibility
//! - Define the exported JSON document.
//! - Validate untrusted documents before any import touches the database.
//! - Turn a validated document (current or legacy v1 shape) into the exact
//!   set of records an import writes.
//!
//! # Invariants
//! - Validation is pure and never consults the store.
//! - A legacy document always yields exactly one project; every idea,
//!   character and chapter without a project is scoped to it.

use crate::clock::now_ms;
use crate::error::ValidationError;
use crate::model::character::Character;
use crate::model::idea::Idea;
use crate::model::idea_type::CustomIdeaType;
use crate::model::outline::{Chapter, Scene};
use crate::model::project::{Project, ProjectId, DEFAULT_PROJECT_ID};
use crate::repo::{RepoError, RepoResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod codec;

pub use codec::ImportSummary;

/// Version written by `Store::export`.
pub const BACKUP_VERSION: u32 = 2;

/// Keys whose presence marks a v1 document.
const LEGACY_KEYS: [&str; 5] = ["story", "ideas", "characters", "chapters", "scenes"];

/// Fields that must be arrays when present and non-null.
const COLLECTION_FIELDS: [&str; 5] = [
    "ideas",
    "characters",
    "chapters",
    "scenes",
    "customIdeaTypes",
];

/// Collections whose records are scoped by `projectId`.
const PROJECT_SCOPED_FIELDS: [&str; 3] = ["ideas", "characters", "chapters"];

/// Full export of a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: u32,
    /// ISO-8601 UTC timestamp with milliseconds.
    pub exported_at: String,
    /// Projects; the name is kept for compatibility with existing backups.
    pub stories: Vec<Project>,
    pub ideas: Vec<Idea>,
    pub characters: Vec<Character>,
    pub chapters: Vec<Chapter>,
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub custom_idea_types: Vec<CustomIdeaType>,
}

/// Checks that `data` looks like a backup this crate can import.
///
/// # Errors
/// - `NotABackup` when `data` is not an object or carries no backup marker.
/// - `NotAnArray` when a collection field is present, non-null and not an
///   array.
pub fn validate(data: &Value) -> Result<(), ValidationError> {
    let Some(object) = data.as_object() else {
        return Err(ValidationError::NotABackup);
    };

    let has_version = object.get("version").is_some_and(Value::is_number);
    let has_stories =
        is_current_version(object) && object.get("stories").is_some_and(Value::is_array);
    let has_legacy = LEGACY_KEYS.iter().any(|key| object.contains_key(*key));
    if !has_version && !has_stories && !has_legacy {
        return Err(ValidationError::NotABackup);
    }

    for field in COLLECTION_FIELDS {
        if let Some(value) = object.get(field) {
            if !value.is_null() && !value.is_array() {
                return Err(ValidationError::NotAnArray(field));
            }
        }
    }
    Ok(())
}

/// Records an import replaces the store contents with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportPlan {
    pub projects: Vec<Project>,
    pub ideas: Vec<Idea>,
    pub characters: Vec<Character>,
    pub chapters: Vec<Chapter>,
    pub scenes: Vec<Scene>,
    /// `None` leaves the custom type catalogue untouched.
    pub custom_idea_types: Option<Vec<CustomIdeaType>>,
    /// Project selected once the import has committed.
    pub selected: Option<ProjectId>,
}

impl ImportPlan {
    /// Decodes a document that already passed `validate`.
    pub(crate) fn from_document(data: &Value) -> RepoResult<Self> {
        let empty = Map::new();
        let object = data.as_object().unwrap_or(&empty);

        let stories = object
            .get("stories")
            .and_then(Value::as_array)
            .filter(|stories| is_current_version(object) && !stories.is_empty());

        let (projects, legacy_scope) = match stories {
            Some(stories) => (decode_projects(stories)?, None),
            None => {
                let project = legacy_project(object.get("story"))?;
                let scope = project.id.clone();
                (vec![project], Some(scope))
            }
        };

        let mut plan = Self {
            ideas: decode_collection(object, "ideas", legacy_scope.as_deref())?,
            characters: decode_collection(object, "characters", legacy_scope.as_deref())?,
            chapters: decode_collection(object, "chapters", legacy_scope.as_deref())?,
            scenes: decode_collection(object, "scenes", None)?,
            custom_idea_types: match object.get("customIdeaTypes") {
                Some(Value::Array(items)) => Some(decode_records("customIdeaTypes", items)?),
                _ => None,
            },
            selected: None,
            projects,
        };
        plan.selected = match legacy_scope {
            Some(scope) => Some(scope),
            None => plan
                .projects
                .first()
                .map(|project| project.id.clone()),
        };
        Ok(plan)
    }
}

fn is_current_version(object: &Map<String, Value>) -> bool {
    object
        .get("version")
        .and_then(Value::as_f64)
        .is_some_and(|version| version >= f64::from(BACKUP_VERSION))
}

/// Builds the single project of a legacy document.
fn legacy_project(story: Option<&Value>) -> RepoResult<Project> {
    let mut project = match story {
        Some(story) if story.is_object() => {
            decode_record::<Project>("story", with_string_id(story.clone()))?
        }
        _ => Project::empty(DEFAULT_PROJECT_ID, now_ms()),
    };
    if project.id.trim().is_empty() {
        project.id = DEFAULT_PROJECT_ID.to_string();
    }
    Ok(project)
}

/// Decodes current-shape projects; every project must carry an id.
fn decode_projects(stories: &[Value]) -> RepoResult<Vec<Project>> {
    let projects = stories
        .iter()
        .map(|story| decode_record::<Project>("stories", with_string_id(story.clone())))
        .collect::<RepoResult<Vec<_>>>()?;
    if projects.iter().any(|project| project.id.trim().is_empty()) {
        return Err(RepoError::InvalidData(
            "bad record in stories: project without id".to_string(),
        ));
    }
    Ok(projects)
}

/// Rewrites a numeric `id` as its decimal string.
fn with_string_id(mut record: Value) -> Value {
    if let Some(object) = record.as_object_mut() {
        if let Some(Value::Number(number)) = object.get("id") {
            let id = Value::String(number.to_string());
            object.insert("id".to_string(), id);
        }
    }
    record
}

fn decode_collection<T: DeserializeOwned>(
    object: &Map<String, Value>,
    field: &str,
    legacy_scope: Option<&str>,
) -> RepoResult<Vec<T>> {
    let Some(Value::Array(items)) = object.get(field) else {
        return Ok(Vec::new());
    };
    if !PROJECT_SCOPED_FIELDS.contains(&field) {
        return decode_records(field, items);
    }

    let scoped = items
        .iter()
        .cloned()
        .map(|mut item| {
            if let Value::Object(record) = &mut item {
                normalize_scope(record, legacy_scope);
            }
            item
        })
        .collect::<Vec<_>>();
    decode_records(field, &scoped)
}

/// Drops null scope keys and, for legacy records, stamps the missing scope.
///
/// `projectId` wins over the `storyId` alias when both are present.
fn normalize_scope(record: &mut Map<String, Value>, legacy_scope: Option<&str>) {
    for key in ["projectId", "storyId"] {
        if record.get(key).is_some_and(Value::is_null) {
            record.remove(key);
        }
    }
    if record.contains_key("projectId") {
        record.remove("storyId");
    }
    if let Some(scope) = legacy_scope {
        if !record.contains_key("projectId") && !record.contains_key("storyId") {
            record.insert("projectId".to_string(), Value::String(scope.to_string()));
        }
    }
}

fn decode_records<T: DeserializeOwned>(field: &str, items: &[Value]) -> RepoResult<Vec<T>> {
    items
        .iter()
        .map(|item| decode_record(field, item.clone()))
        .collect()
}

fn decode_record<T: DeserializeOwned>(field: &str, item: Value) -> RepoResult<T> {
    serde_json::from_value(item)
        .map_err(|err| RepoError::InvalidData(format!("bad record in {field}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{validate, ImportPlan};
    use crate::error::ValidationError;
    use serde_json::json;

    #[test]
    fn validate_rejects_non_objects() {
        assert_eq!(validate(&json!(null)), Err(ValidationError::NotABackup));
        assert_eq!(validate(&json!([1, 2])), Err(ValidationError::NotABackup));
        assert_eq!(validate(&json!("backup")), Err(ValidationError::NotABackup));
    }

    #[test]
    fn validate_requires_a_backup_marker() {
        assert_eq!(
            validate(&json!({ "foo": 1 })),
            Err(ValidationError::NotABackup)
        );
        assert_eq!(validate(&json!({ "version": 1 })), Ok(()));
        assert_eq!(validate(&json!({ "story": null })), Ok(()));
        assert_eq!(validate(&json!({ "scenes": [] })), Ok(()));
    }

    #[test]
    fn validate_rejects_non_array_collections() {
        assert_eq!(
            validate(&json!({ "version": 2, "stories": [], "ideas": {} })),
            Err(ValidationError::NotAnArray("ideas"))
        );
        assert_eq!(
            validate(&json!({ "chapters": "x" })),
            Err(ValidationError::NotAnArray("chapters"))
        );
        assert_eq!(
            validate(&json!({ "version": 2, "customIdeaTypes": 3 })),
            Err(ValidationError::NotAnArray("customIdeaTypes"))
        );
        assert_eq!(validate(&json!({ "version": 2, "ideas": null })), Ok(()));
    }

    #[test]
    fn legacy_plan_stamps_missing_scope() {
        let plan = ImportPlan::from_document(&json!({
            "version": 1,
            "story": { "id": "old", "oneSentence": "Heist on the moon." },
            "ideas": [
                { "id": "i1", "type": "plot", "title": "Opening" },
                { "id": "i2", "storyId": "elsewhere" },
                { "id": "i3", "projectId": null }
            ],
            "scenes": [{ "id": "s1", "chapterId": "c1" }]
        }))
        .unwrap();

        assert_eq!(plan.projects.len(), 1);
        assert_eq!(plan.projects[0].id, "old");
        assert_eq!(plan.selected.as_deref(), Some("old"));
        let scopes: Vec<_> = plan.ideas.iter().map(|idea| idea.project_id.as_str()).collect();
        assert_eq!(scopes, vec!["old", "elsewhere", "old"]);
        assert_eq!(plan.scenes[0].chapter_id, "c1");
        assert_eq!(plan.custom_idea_types, None);
    }

    #[test]
    fn legacy_plan_without_story_uses_default_project() {
        let plan = ImportPlan::from_document(&json!({ "ideas": [] })).unwrap();
        assert_eq!(plan.projects[0].id, "story");
        assert_eq!(plan.selected.as_deref(), Some("story"));
    }

    #[test]
    fn current_plan_with_empty_stories_is_read_as_legacy() {
        let plan = ImportPlan::from_document(&json!({
            "version": 2,
            "stories": [],
            "chapters": [{ "id": "c1", "title": "One" }]
        }))
        .unwrap();
        assert_eq!(plan.projects[0].id, "story");
        assert_eq!(plan.chapters[0].project_id, "story");
    }

    #[test]
    fn project_id_wins_over_story_id_alias() {
        let plan = ImportPlan::from_document(&json!({
            "version": 2,
            "stories": [{ "id": "p1" }, { "id": "p2" }],
            "ideas": [{ "id": "i1", "projectId": "p2", "storyId": "p1" }],
            "characters": [{ "id": "c1", "projectId": null, "storyId": "p1" }]
        }))
        .unwrap();
        assert_eq!(plan.ideas[0].project_id, "p2");
        assert_eq!(plan.characters[0].project_id, "p1");
    }

    #[test]
    fn numeric_project_ids_become_strings() {
        let legacy = ImportPlan::from_document(&json!({
            "version": 1,
            "story": { "id": 7, "oneSentence": "Numbered." },
            "ideas": [{ "id": "i1" }]
        }))
        .unwrap();
        assert_eq!(legacy.projects[0].id, "7");
        assert_eq!(legacy.selected.as_deref(), Some("7"));
        assert_eq!(legacy.ideas[0].project_id, "7");

        let current = ImportPlan::from_document(&json!({
            "version": 2,
            "stories": [{ "id": 3 }]
        }))
        .unwrap();
        assert_eq!(current.projects[0].id, "3");
    }

    #[test]
    fn current_plan_rejects_projects_without_id() {
        for stories in [json!([{ "oneSentence": "no id" }]), json!([{ "id": "  " }])] {
            let err = ImportPlan::from_document(&json!({ "version": 2, "stories": stories }))
                .unwrap_err();
            assert!(err.to_string().contains("project without id"));
        }
    }

    #[test]
    fn current_plan_requires_scoped_records() {
        let err = ImportPlan::from_document(&json!({
            "version": 2,
            "stories": [{ "id": "p1" }],
            "ideas": [{ "id": "i1" }]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("bad record in ideas"));
    }
}
