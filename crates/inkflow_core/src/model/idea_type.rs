//! Idea card categories: the built-in catalogue plus user-defined names.
//!
//! # Invariants
//! - Built-in slugs are stable storage values; display labels are resolved by
//!   the caller through the `ideas.<slug>` localization key.
//! - Any string that is not a built-in slug is a custom type name and is
//!   stored verbatim.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Display grouping for built-in idea types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaTypeGroup {
    Story,
    Characters,
    World,
    Objects,
    Abstract,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltInIdeaType {
    Plot,
    Subplot,
    Scene,
    Event,
    Character,
    Relationship,
    Faction,
    World,
    Location,
    Culture,
    Item,
    Creature,
    MagicSystem,
    Technology,
    Concept,
    Conflict,
    Mystery,
    Symbol,
    Prophecy,
    Other,
}

impl BuiltInIdeaType {
    /// Built-in types in display order.
    pub const ALL: [BuiltInIdeaType; 20] = [
        Self::Plot,
        Self::Subplot,
        Self::Scene,
        Self::Event,
        Self::Character,
        Self::Relationship,
        Self::Faction,
        Self::World,
        Self::Location,
        Self::Culture,
        Self::Item,
        Self::Creature,
        Self::MagicSystem,
        Self::Technology,
        Self::Concept,
        Self::Conflict,
        Self::Mystery,
        Self::Symbol,
        Self::Prophecy,
        Self::Other,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Plot => "plot",
            Self::Subplot => "subplot",
            Self::Scene => "scene",
            Self::Event => "event",
            Self::Character => "character",
            Self::Relationship => "relationship",
            Self::Faction => "faction",
            Self::World => "world",
            Self::Location => "location",
            Self::Culture => "culture",
            Self::Item => "item",
            Self::Creature => "creature",
            Self::MagicSystem => "magic_system",
            Self::Technology => "technology",
            Self::Concept => "concept",
            Self::Conflict => "conflict",
            Self::Mystery => "mystery",
            Self::Symbol => "symbol",
            Self::Prophecy => "prophecy",
            Self::Other => "other",
        }
    }

    pub fn group(self) -> IdeaTypeGroup {
        match self {
            Self::Plot | Self::Subplot | Self::Scene | Self::Event => IdeaTypeGroup::Story,
            Self::Character | Self::Relationship | Self::Faction => IdeaTypeGroup::Characters,
            Self::World | Self::Location | Self::Culture => IdeaTypeGroup::World,
            Self::Item | Self::Creature | Self::MagicSystem | Self::Technology => {
                IdeaTypeGroup::Objects
            }
            Self::Concept | Self::Conflict | Self::Mystery | Self::Symbol | Self::Prophecy => {
                IdeaTypeGroup::Abstract
            }
            Self::Other => IdeaTypeGroup::Other,
        }
    }

    pub fn from_slug(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == value)
    }

    /// Localization key for the display label, e.g. `ideas.plot`.
    pub fn label_key(self) -> String {
        format!("ideas.{}", self.slug())
    }
}

/// Category stored in `ideas.type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IdeaType {
    BuiltIn(BuiltInIdeaType),
    Custom(String),
}

/// Type assigned to new ideas when the caller does not choose one.
pub const DEFAULT_IDEA_TYPE: IdeaType = IdeaType::BuiltIn(BuiltInIdeaType::Plot);

impl IdeaType {
    /// Parses a stored value: built-in slug first, custom name otherwise.
    pub fn parse(value: &str) -> Self {
        match BuiltInIdeaType::from_slug(value) {
            Some(kind) => Self::BuiltIn(kind),
            None => Self::Custom(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::BuiltIn(kind) => kind.slug(),
            Self::Custom(name) => name.as_str(),
        }
    }

    pub fn is_built_in(&self) -> bool {
        matches!(self, Self::BuiltIn(_))
    }

    /// Resolves a display label: built-ins through `translate`, custom names
    /// as-is.
    pub fn label(&self, translate: impl Fn(&str) -> String) -> String {
        match self {
            Self::BuiltIn(kind) => translate(kind.label_key().as_str()),
            Self::Custom(name) => name.clone(),
        }
    }
}

impl Default for IdeaType {
    fn default() -> Self {
        DEFAULT_IDEA_TYPE
    }
}

impl From<String> for IdeaType {
    fn from(value: String) -> Self {
        match BuiltInIdeaType::from_slug(value.as_str()) {
            Some(kind) => Self::BuiltIn(kind),
            None => Self::Custom(value),
        }
    }
}

impl From<IdeaType> for String {
    fn from(value: IdeaType) -> Self {
        match value {
            IdeaType::BuiltIn(kind) => kind.slug().to_string(),
            IdeaType::Custom(name) => name,
        }
    }
}

impl From<BuiltInIdeaType> for IdeaType {
    fn from(value: BuiltInIdeaType) -> Self {
        Self::BuiltIn(value)
    }
}

impl Display for IdeaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-defined idea type kept in the custom catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomIdeaType {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

/// Normalizes a custom type name: trims and collapses inner whitespace.
///
/// Returns `None` for blank input.
pub fn normalize_custom_type_name(name: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(name.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_custom_type_name, BuiltInIdeaType, IdeaType, IdeaTypeGroup};
    use std::collections::HashSet;

    #[test]
    fn built_in_slugs_are_unique_and_round_trip() {
        let slugs: HashSet<_> = BuiltInIdeaType::ALL.iter().map(|kind| kind.slug()).collect();
        assert_eq!(slugs.len(), BuiltInIdeaType::ALL.len());
        for kind in BuiltInIdeaType::ALL {
            assert_eq!(BuiltInIdeaType::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(BuiltInIdeaType::MagicSystem.group(), IdeaTypeGroup::Objects);
    }

    #[test]
    fn unknown_values_become_custom_types() {
        assert_eq!(
            IdeaType::parse("plot"),
            IdeaType::BuiltIn(BuiltInIdeaType::Plot)
        );
        assert_eq!(
            IdeaType::parse("Heist beat"),
            IdeaType::Custom("Heist beat".to_string())
        );
        assert!(!IdeaType::parse("Plot").is_built_in());
    }

    #[test]
    fn serializes_as_plain_string() {
        let value = serde_json::to_value(IdeaType::parse("magic_system")).unwrap();
        assert_eq!(value, serde_json::json!("magic_system"));
        let custom: IdeaType = serde_json::from_value(serde_json::json!("Omen")).unwrap();
        assert_eq!(custom.as_str(), "Omen");
    }

    #[test]
    fn label_translates_only_built_ins() {
        let translate = |key: &str| format!("<{key}>");
        assert_eq!(IdeaType::parse("plot").label(translate), "<ideas.plot>");
        assert_eq!(IdeaType::parse("Omen").label(translate), "Omen");
    }

    #[test]
    fn custom_names_are_trimmed_and_collapsed() {
        assert_eq!(
            normalize_custom_type_name("  Secret \t  society "),
            Some("Secret society".to_string())
        );
        assert_eq!(normalize_custom_type_name(" \n "), None);
    }
}
