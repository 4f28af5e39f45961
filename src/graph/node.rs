//! Node representation in the knowledge graph

use super::validation::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Unique identifier for a node
///
/// Serializes as a plain string (e.g. "smart_pointer", "lang:cpp")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of entity a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Concept,
    Language,
    Technology,
    Library,
    Tool,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Concept,
        NodeType::Language,
        NodeType::Technology,
        NodeType::Library,
        NodeType::Tool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Concept => "concept",
            NodeType::Language => "language",
            NodeType::Technology => "technology",
            NodeType::Library => "library",
            NodeType::Tool => "tool",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownNodeType(s.to_string()))
    }
}

/// How hard a concept is to learn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 4] = [
        DifficultyLevel::Beginner,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Advanced,
        DifficultyLevel::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
            DifficultyLevel::Expert => "expert",
        }
    }
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DifficultyLevel::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownDifficulty(s.to_string()))
    }
}

/// Typed property values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Object(BTreeMap<String, PropertyValue>),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

/// Properties collection
///
/// Ordered so that serialized entities compare equal across backends.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Creation and modification timestamps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// When the entity was created
    pub created_at: Option<DateTime<Utc>>,
    /// When the entity was last modified
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityMetadata {
    pub(crate) fn now() -> Self {
        let now = Utc::now();
        Self {
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// A node in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier, immutable after creation
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Kind of entity
    pub node_type: NodeType,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Programming language this node belongs to (e.g. "cpp")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Primary category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Difficulty for learners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<DifficultyLevel>,
    /// Free-form tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Domain-specific properties
    #[serde(default)]
    pub properties: Properties,
    /// Timestamps
    #[serde(default)]
    pub metadata: EntityMetadata,
}

impl Node {
    /// Create a new node with the given id, name and type
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            description: String::new(),
            language: None,
            category: None,
            difficulty_level: None,
            tags: Vec::new(),
            properties: Properties::new(),
            metadata: EntityMetadata::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_difficulty(mut self, level: DifficultyLevel) -> Self {
        self.difficulty_level = Some(level);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add a property to the node
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Check the structural invariants of a node
    ///
    /// `node_type` and `difficulty_level` are closed enums, so only the id
    /// and name need checking here; string coercion happens in `FromStr`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyId("node"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        Ok(())
    }

    /// Apply a partial update in place
    ///
    /// The id is immutable; a patch that names a different id is rejected
    /// before any field is touched.
    pub fn apply(&mut self, update: NodeUpdate) -> Result<(), ValidationError> {
        if let Some(ref id) = update.id {
            if id != &self.id {
                return Err(ValidationError::ImmutableField("id"));
            }
        }

        let mut patched = self.clone();
        if let Some(name) = update.name {
            patched.name = name;
        }
        if let Some(node_type) = update.node_type {
            patched.node_type = node_type;
        }
        if let Some(description) = update.description {
            patched.description = description;
        }
        if let Some(language) = update.language {
            patched.language = language;
        }
        if let Some(category) = update.category {
            patched.category = category;
        }
        if let Some(level) = update.difficulty_level {
            patched.difficulty_level = level;
        }
        if let Some(tags) = update.tags {
            patched.tags = tags;
        }
        for (k, v) in update.properties {
            patched.properties.insert(k, v);
        }
        patched.validate()?;

        patched.metadata.updated_at = Some(Utc::now());
        *self = patched;
        Ok(())
    }
}

/// A partial set of node fields to merge into an existing node
///
/// `None` leaves a field untouched. For optional node fields the inner
/// `Option` clears (`Some(None)`) or sets (`Some(Some(_))`) the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeUpdate {
    /// Present only to detect attempts to change the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<Option<DifficultyLevel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Merged key by key into the node's properties
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn language(mut self, language: Option<String>) -> Self {
        self.language = Some(language);
        self
    }

    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = Some(category);
        self
    }

    pub fn difficulty(mut self, level: Option<DifficultyLevel>) -> Self {
        self.difficulty_level = Some(level);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
