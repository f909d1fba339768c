//! Prompt context for the external text-expansion collaborator.
//!
//! # Responsibility
//! - Gather the current project, its ideas and its characters from the store.
//! - Render them into the system/user prompt pair a `TextExpander` sends to a
//!   remote model.
//!
//! # Invariants
//! - Prompt building is pure; only `ExpandContext::load` touches the store.
//! - The remote client itself lives outside this crate.

use crate::error::StoreResult;
use crate::model::character::Character;
use crate::model::idea::Idea;
use crate::model::project::Project;
use crate::store::Store;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_IDEA_BODY_CHARS: usize = 200;
const MAX_CHARACTER_SUMMARY_CHARS: usize = 120;

static TRAILING_COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*/ai\s*$").expect("valid trailing command regex"));
static LEADING_COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*/ai\s*").expect("valid leading command regex"));

/// Output language of an expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Zh,
    Es,
    Fr,
}

impl Locale {
    /// Parses a locale code; unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "en" => Some(Self::En),
            "zh" => Some(Self::Zh),
            "es" => Some(Self::Es),
            "fr" => Some(Self::Fr),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
            Self::Es => "es",
            Self::Fr => "fr",
        }
    }

    pub fn language_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Zh => "Chinese (中文)",
            Self::Es => "Spanish (Español)",
            Self::Fr => "French (Français)",
        }
    }

    /// Instruction that pins the response language.
    pub fn language_rule(self) -> String {
        match self {
            Self::Zh => "CRITICAL: You must write the entire response in Chinese only (中文). Do not use English or any other language. 请只用中文回复。".to_string(),
            other => format!(
                "CRITICAL: You must write the entire response in {} only. Do not use any other language.",
                other.language_name()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// The collaborator is not configured (for example, no API key).
    Unavailable(String),
    /// The remote call failed.
    Request(String),
    /// The remote call succeeded without any text.
    EmptyResponse,
}

impl Display for ExpandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "text expansion unavailable: {message}"),
            Self::Request(message) => write!(f, "text expansion failed: {message}"),
            Self::EmptyResponse => write!(f, "empty response from text expansion"),
        }
    }
}

impl Error for ExpandError {}

/// Remote collaborator that turns a brief into expanded prose.
pub trait TextExpander {
    fn expand(&self, request: &ExpandRequest) -> Result<String, ExpandError>;
}

/// System/user prompt pair sent to the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandPrompt {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandRequest {
    /// Field text as typed, possibly with an `/ai` command.
    pub current_text: String,
    /// Human-readable name of the field being expanded.
    pub field_name: String,
    pub story: Option<Project>,
    pub ideas: Vec<Idea>,
    pub characters: Vec<Character>,
    pub locale: Locale,
}

impl ExpandRequest {
    /// Field text without a leading or trailing `/ai` command.
    pub fn brief_text(&self) -> String {
        let without_trailing = TRAILING_COMMAND_RE.replace(&self.current_text, "");
        LEADING_COMMAND_RE
            .replace(&without_trailing, "")
            .trim()
            .to_string()
    }

    /// Filled spine fields, one labelled line each.
    pub fn story_blurb(&self) -> String {
        let Some(story) = &self.story else {
            return String::new();
        };
        [
            ("One-sentence", &story.one_sentence),
            ("Setup", &story.setup),
            ("Disaster 1", &story.disaster1),
            ("Disaster 2", &story.disaster2),
            ("Disaster 3", &story.disaster3),
            ("Ending", &story.ending),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("{label}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
    }

    pub fn ideas_blurb(&self) -> String {
        if self.ideas.is_empty() {
            return "(No idea cards yet)".to_string();
        }
        self.ideas
            .iter()
            .map(|idea| {
                format!(
                    "- [{}] {}: {}",
                    idea.kind,
                    non_empty_or(&idea.title, "Untitled"),
                    truncate_chars(&idea.body, MAX_IDEA_BODY_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn characters_blurb(&self) -> String {
        if self.characters.is_empty() {
            return "(No characters yet)".to_string();
        }
        self.characters
            .iter()
            .map(|character| {
                format!(
                    "- {}: {}",
                    non_empty_or(&character.name, "Unnamed"),
                    truncate_chars(&character.one_sentence, MAX_CHARACTER_SUMMARY_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Builds the prompt pair; an empty brief asks for fresh content.
    pub fn prompt(&self) -> ExpandPrompt {
        let language_rule = self.locale.language_rule();
        let system = format!(
            "You are a fiction writing assistant. The writer is using the Snowflake Method. \
             Keep all output in Snowflake style: simple, clear, structural, no artistic or \
             flowery descriptions, no purple prose. The text must relate to and stay consistent \
             with the story spine, idea cards, and characters provided. {language_rule} Output \
             only the expanded text, no preamble, no \"Here is...\", no quotes around the result."
        );

        let field = &self.field_name;
        let story = non_empty_or(&self.story_blurb(), "(Not filled yet)").to_string();
        let ideas = self.ideas_blurb();
        let characters = self.characters_blurb();
        let brief = self.brief_text();

        let user = if brief.is_empty() {
            format!(
                "The user has left this field empty. Generate content for the field \"{field}\" \
                 based only on the story, ideas, and characters below. Your text must continue the \
                 same narrative (same characters, setting, and events already described). Do not \
                 invent a new story or generic filler. Use the same language as the existing story \
                 content when possible. {language_rule}\n\n\
                 Story context:\n{story}\n\n\
                 Idea cards:\n{ideas}\n\n\
                 Characters:\n{characters}\n\n\
                 Generate appropriate content for \"{field}\" (output only the text, in the required language):"
            )
        } else {
            format!(
                "Current field: \"{field}\".\n\n\
                 Story context (use this to keep the expansion consistent with the plot):\n{story}\n\n\
                 Idea cards (weave in relevant ideas from these when they fit):\n{ideas}\n\n\
                 Characters (reference names and traits so the expansion fits the cast):\n{characters}\n\n\
                 Brief text to expand:\n{brief}\n\n\
                 Expanded version ({language_rule} output only the text):"
            )
        };

        ExpandPrompt { system, user }
    }
}

/// Store data an expansion is grounded in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandContext {
    pub story: Option<Project>,
    pub ideas: Vec<Idea>,
    pub characters: Vec<Character>,
}

impl ExpandContext {
    /// Loads the current project with its ideas and characters.
    pub fn load(store: &Store) -> StoreResult<Self> {
        let story = store.get_current_project()?;
        let scope = story.as_ref().map(|project| project.id.as_str());
        Ok(Self {
            ideas: store.list_ideas(scope)?,
            characters: store.list_characters(scope)?,
            story,
        })
    }

    pub fn request(
        &self,
        current_text: impl Into<String>,
        field_name: impl Into<String>,
        locale: Locale,
    ) -> ExpandRequest {
        ExpandRequest {
            current_text: current_text.into(),
            field_name: field_name.into(),
            story: self.story.clone(),
            ideas: self.ideas.clone(),
            characters: self.characters.clone(),
            locale,
        }
    }

    /// Builds the request and hands it to `expander`.
    pub fn expand_with(
        &self,
        expander: &dyn TextExpander,
        current_text: &str,
        field_name: &str,
        locale: Locale,
    ) -> Result<String, ExpandError> {
        let request = self.request(current_text, field_name, locale);
        let expanded = expander.expand(&request)?;
        let expanded = expanded.trim();
        if expanded.is_empty() {
            return Err(ExpandError::EmptyResponse);
        }
        Ok(expanded.to_string())
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::{
        ExpandContext, ExpandError, ExpandRequest, Locale, TextExpander,
    };
    use crate::model::character::Character;
    use crate::model::idea::Idea;
    use crate::model::idea_type::IdeaType;
    use crate::model::project::Project;
    use serde_json::Map;

    fn request(text: &str) -> ExpandRequest {
        ExpandRequest {
            current_text: text.to_string(),
            field_name: "Setup".to_string(),
            story: None,
            ideas: Vec::new(),
            characters: Vec::new(),
            locale: Locale::En,
        }
    }

    fn idea(title: &str, body: &str) -> Idea {
        Idea {
            id: "i1".to_string(),
            project_id: "story".to_string(),
            kind: IdeaType::parse("mystery"),
            title: title.to_string(),
            body: body.to_string(),
            created_at: 1,
            updated_at: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn brief_text_strips_ai_command() {
        assert_eq!(request("A storm hits /AI  ").brief_text(), "A storm hits");
        assert_eq!(request("  /ai the ferry sinks").brief_text(), "the ferry sinks");
        assert_eq!(request("/ai").brief_text(), "");
    }

    #[test]
    fn story_blurb_skips_empty_fields() {
        let mut story = Project::empty("story", 1);
        story.one_sentence = "A lighthouse keeper hides a smuggler.".to_string();
        story.ending = "The light goes out.".to_string();
        let mut req = request("");
        req.story = Some(story);
        assert_eq!(
            req.story_blurb(),
            "One-sentence: A lighthouse keeper hides a smuggler.\nEnding: The light goes out."
        );
    }

    #[test]
    fn blurbs_use_placeholders_and_truncate() {
        let mut req = request("x");
        assert_eq!(req.ideas_blurb(), "(No idea cards yet)");
        assert_eq!(req.characters_blurb(), "(No characters yet)");

        req.ideas = vec![idea("", &"é".repeat(250))];
        req.characters = vec![Character {
            id: "c1".to_string(),
            project_id: "story".to_string(),
            name: String::new(),
            one_sentence: "Keeps every promise.".to_string(),
            created_at: 1,
            updated_at: None,
            extra: Map::new(),
        }];
        assert_eq!(
            req.ideas_blurb(),
            format!("- [mystery] Untitled: {}", "é".repeat(200))
        );
        assert_eq!(req.characters_blurb(), "- Unnamed: Keeps every promise.");
    }

    #[test]
    fn prompt_switches_on_empty_brief() {
        let empty = request(" /ai ").prompt();
        assert!(empty.user.starts_with("The user has left this field empty."));
        assert!(empty.user.contains("(Not filled yet)"));

        let filled = request("The harbor floods.").prompt();
        assert!(filled.user.starts_with("Current field: \"Setup\"."));
        assert!(filled.user.contains("Brief text to expand:\nThe harbor floods."));
        assert!(filled.system.contains("in English only"));
    }

    #[test]
    fn chinese_rule_is_explicit() {
        assert!(Locale::Zh.language_rule().contains("请只用中文回复"));
        assert_eq!(Locale::from_code("fr"), Some(Locale::Fr));
        assert_eq!(Locale::from_code("de"), None);
        assert_eq!(Locale::default().code(), "en");
    }

    struct Echo(&'static str);

    impl TextExpander for Echo {
        fn expand(&self, _request: &ExpandRequest) -> Result<String, ExpandError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn expand_with_rejects_blank_output() {
        let context = ExpandContext::default();
        assert_eq!(
            context.expand_with(&Echo("  more  "), "brief", "Setup", Locale::En),
            Ok("more".to_string())
        );
        assert_eq!(
            context.expand_with(&Echo("   "), "brief", "Setup", Locale::En),
            Err(ExpandError::EmptyResponse)
        );
    }
}
