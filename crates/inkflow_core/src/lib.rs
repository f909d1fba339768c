//! Local storage core for the InkFlow writing organizer.
//!
//! Everything goes through [`Store`]: projects (story spines), idea cards,
//! characters, chapters and scenes, plus whole-store backups.

pub mod backup;
mod clock;
pub mod db;
pub mod error;
pub mod expand;
pub mod logging;
pub mod model;
pub mod repo;
pub mod selector;
pub mod store;

pub use backup::{validate, BackupDocument, ImportSummary, BACKUP_VERSION};
pub use error::{
    failure_policy, Component, FailurePolicy, StorageError, StorageOp, StoreError, StoreResult,
    ValidationError, FAILURE_POLICIES,
};
pub use expand::{ExpandContext, ExpandError, ExpandPrompt, ExpandRequest, Locale, TextExpander};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::character::{Character, CharacterId, CharacterPatch, NewCharacter};
pub use model::idea::{Idea, IdeaId, IdeaPatch, NewIdea};
pub use model::idea_type::{
    BuiltInIdeaType, CustomIdeaType, IdeaType, IdeaTypeGroup, DEFAULT_IDEA_TYPE,
};
pub use model::outline::{
    Chapter, ChapterId, ChapterPatch, NewChapter, NewScene, Outline, OutlineChapter, Scene,
    SceneId, ScenePatch,
};
pub use model::project::{Project, ProjectDraft, ProjectId, DEFAULT_PROJECT_ID};
pub use selector::{FileSlot, MemorySlot, ProjectSelector, SelectorSlot};
pub use store::{Store, StoreConfig};
