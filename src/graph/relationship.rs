//! Typed, directed relationships between nodes

use super::node::{EntityMetadata, NodeId, Properties, PropertyValue};
use super::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(String);

impl RelationshipId {
    /// Create a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a RelationshipId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RelationshipId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RelationshipId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

macro_rules! relationship_types {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Kind of relationship
        ///
        /// The vocabulary is open: anything outside the known set is kept
        /// verbatim in `Other`.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum RelationshipType {
            $($variant,)+
            Other(String),
        }

        impl RelationshipType {
            pub fn as_str(&self) -> &str {
                match self {
                    $(RelationshipType::$variant => $name,)+
                    RelationshipType::Other(s) => s.as_str(),
                }
            }
        }

        impl FromStr for RelationshipType {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(RelationshipType::$variant),)+
                    other if other.trim().is_empty() => Err(ValidationError::EmptyRelationshipType),
                    other => Ok(RelationshipType::Other(other.to_string())),
                }
            }
        }
    };
}

relationship_types! {
    BelongsTo => "belongs_to",
    IsA => "is_a",
    PartOf => "part_of",
    Contains => "contains",
    DependsOn => "depends_on",
    Requires => "requires",
    Prerequisite => "prerequisite",
    Implements => "implements",
    Uses => "uses",
    Extends => "extends",
    Inherits => "inherits",
    RelatedTo => "related_to",
    SimilarTo => "similar_to",
    OppositeOf => "opposite_of",
    ContrastsWith => "contrasts_with",
    Before => "before",
    After => "after",
    LeadsTo => "leads_to",
    LearningPath => "learning_path",
    RecommendedAfter => "recommended_after",
    BuildsUpon => "builds_upon",
    AppliesTo => "applies_to",
    Solves => "solves",
    ExampleOf => "example_of",
    AlternativeTo => "alternative_to",
}

impl RelationshipType {
    /// Whether this edge carries prerequisite/ordering semantics
    pub fn is_prerequisite(&self) -> bool {
        matches!(
            self,
            RelationshipType::DependsOn
                | RelationshipType::LearningPath
                | RelationshipType::BuildsUpon
                | RelationshipType::Prerequisite
        )
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RelationshipType> for String {
    fn from(t: RelationshipType) -> Self {
        t.as_str().to_string()
    }
}

impl TryFrom<String> for RelationshipType {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Serialize for RelationshipType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationshipType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn default_weight() -> f64 {
    1.0
}

/// A directed, typed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier
    pub id: RelationshipId,
    /// Source node
    pub source_id: NodeId,
    /// Target node
    pub target_id: NodeId,
    /// Type of relationship (e.g. "depends_on", "implements")
    pub relationship_type: RelationshipType,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Path cost, defaults to 1
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Additional properties
    #[serde(default)]
    pub properties: Properties,
    /// Timestamps
    #[serde(default)]
    pub metadata: EntityMetadata,
}

impl Relationship {
    /// Create a new relationship
    pub fn new(
        id: impl Into<RelationshipId>,
        source_id: impl Into<NodeId>,
        target_id: impl Into<NodeId>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type,
            description: String::new(),
            weight: default_weight(),
            properties: Properties::new(),
            metadata: EntityMetadata::now(),
        }
    }

    /// Create a relationship with a generated id
    pub fn between(
        source_id: impl Into<NodeId>,
        target_id: impl Into<NodeId>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self::new(RelationshipId::generate(), source_id, target_id, relationship_type)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Whether `node_id` is the source or the target
    pub fn touches(&self, node_id: &NodeId) -> bool {
        &self.source_id == node_id || &self.target_id == node_id
    }

    /// The endpoint on the other side of `node_id`
    pub fn other_end(&self, node_id: &NodeId) -> &NodeId {
        if &self.source_id == node_id {
            &self.target_id
        } else {
            &self.source_id
        }
    }

    /// Check the structural invariants of a relationship
    ///
    /// Endpoint existence is the store's concern, not checked here.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyId("relationship"));
        }
        if self.source_id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyField("source_id"));
        }
        if self.target_id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyField("target_id"));
        }
        if self.relationship_type.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyRelationshipType);
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ValidationError::InvalidWeight(self.weight.to_string()));
        }
        Ok(())
    }
}
