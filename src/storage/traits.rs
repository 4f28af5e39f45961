//! Storage trait definitions

use crate::graph::{
    Node, NodeId, NodeType, NodeUpdate, Relationship, RelationshipId, RelationshipType,
    ValidationError,
};
use std::path::Path;
use thiserror::Error;

/// Which kind of entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Relationship,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Node => f.write_str("Node"),
            EntityKind::Relationship => f.write_str("Relationship"),
        }
    }
}

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{kind} already exists: {id}")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Relationship {relationship} references missing node: {node}")]
    InvalidEndpoint { relationship: String, node: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database unreachable: {0}")]
    Connectivity(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    pub fn node_not_found(id: &NodeId) -> Self {
        StorageError::NotFound {
            kind: EntityKind::Node,
            id: id.to_string(),
        }
    }

    pub fn relationship_not_found(id: &RelationshipId) -> Self {
        StorageError::NotFound {
            kind: EntityKind::Relationship,
            id: id.to_string(),
        }
    }

    pub fn duplicate_node(id: &NodeId) -> Self {
        StorageError::DuplicateId {
            kind: EntityKind::Node,
            id: id.to_string(),
        }
    }

    pub fn duplicate_relationship(id: &RelationshipId) -> Self {
        StorageError::DuplicateId {
            kind: EntityKind::Relationship,
            id: id.to_string(),
        }
    }

    /// Only connectivity failures are transient; everything else is a
    /// caller error or a bug and must surface immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Connectivity(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Direction for adjacency lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Follow outgoing edges (source -> target)
    #[default]
    Outgoing,
    /// Follow incoming edges (target <- source)
    Incoming,
    /// Follow edges in both directions
    Both,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outgoing" | "out" => Ok(Direction::Outgoing),
            "incoming" | "in" => Ok(Direction::Incoming),
            "both" => Ok(Direction::Both),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Filter criteria for listing nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeFilter {
    /// Filter by node type
    pub node_type: Option<NodeType>,
    /// Filter by language tag (exact match)
    pub language: Option<String>,
    /// Case-insensitive substring match on name or description
    pub search_text: Option<String>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl NodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check a node against every criterion except `limit`
    ///
    /// Both backends go through this so filtering is identical regardless
    /// of where the data lives.
    pub fn matches(&self, node: &Node) -> bool {
        if let Some(node_type) = self.node_type {
            if node.node_type != node_type {
                return false;
            }
        }

        if let Some(ref language) = self.language {
            if node.language.as_deref() != Some(language.as_str()) {
                return false;
            }
        }

        if let Some(ref text) = self.search_text {
            let needle = text.to_lowercase();
            if !node.name.to_lowercase().contains(&needle)
                && !node.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        true
    }
}

/// Filter criteria for listing relationships
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipFilter {
    pub relationship_type: Option<RelationshipType>,
    /// Only relationships leaving this node
    pub source: Option<NodeId>,
    /// Only relationships entering this node
    pub target: Option<NodeId>,
}

impl RelationshipFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, relationship_type: RelationshipType) -> Self {
        self.relationship_type = Some(relationship_type);
        self
    }

    pub fn from_node(mut self, source: impl Into<NodeId>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn to_node(mut self, target: impl Into<NodeId>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn matches(&self, relationship: &Relationship) -> bool {
        self.relationship_type
            .as_ref()
            .map_or(true, |t| &relationship.relationship_type == t)
            && self
                .source
                .as_ref()
                .map_or(true, |id| &relationship.source_id == id)
            && self
                .target
                .as_ref()
                .map_or(true, |id| &relationship.target_id == id)
    }
}

/// Trait for graph storage backends
///
/// Implementations must be thread-safe (Send + Sync) to support
/// concurrent access from multiple threads. Every implementation must
/// produce the same observable results for the same graph contents:
/// enumeration and adjacency follow insertion order, and `adjacent` with
/// `Direction::Both` yields outgoing edges before incoming ones, listing a
/// self-loop once.
pub trait GraphStore: Send + Sync {
    // === Node Operations ===

    /// Insert a new node; fails if the id is taken
    fn create_node(&self, node: Node) -> StorageResult<Node>;

    /// Load a node by ID
    fn get_node(&self, id: &NodeId) -> StorageResult<Node>;

    /// Merge the provided fields into an existing node
    fn update_node(&self, id: &NodeId, update: NodeUpdate) -> StorageResult<Node>;

    /// Delete a node together with every relationship touching it
    fn delete_node(&self, id: &NodeId) -> StorageResult<()>;

    /// List nodes matching a filter, in insertion order
    fn list_nodes(&self, filter: &NodeFilter) -> StorageResult<Vec<Node>>;

    // === Relationship Operations ===

    /// Insert a new relationship; both endpoints must exist
    fn create_relationship(&self, relationship: Relationship) -> StorageResult<Relationship>;

    /// Load a relationship by ID
    fn get_relationship(&self, id: &RelationshipId) -> StorageResult<Relationship>;

    /// Delete a relationship
    fn delete_relationship(&self, id: &RelationshipId) -> StorageResult<()>;

    // === Adjacency & Enumeration ===

    /// Relationships incident to a node paired with the node on the other end
    fn adjacent(&self, id: &NodeId, direction: Direction) -> StorageResult<Vec<(Relationship, Node)>>;

    /// Every node id, in insertion order
    fn all_node_ids(&self) -> StorageResult<Vec<NodeId>>;

    /// Every relationship, in insertion order
    fn all_relationships(&self) -> StorageResult<Vec<Relationship>>;

    /// Relationships matching a filter, in insertion order
    fn list_relationships(&self, filter: &RelationshipFilter) -> StorageResult<Vec<Relationship>> {
        Ok(self
            .all_relationships()?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect())
    }

    /// Remove every node and relationship in one step
    fn clear(&self) -> StorageResult<()>;

    /// Number of stored nodes
    fn node_count(&self) -> StorageResult<usize> {
        Ok(self.all_node_ids()?.len())
    }

    /// Number of stored relationships
    fn relationship_count(&self) -> StorageResult<usize> {
        Ok(self.all_relationships()?.len())
    }
}

/// Backends that live in a file and can also run in memory
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create a throwaway store that lives only in memory
    fn open_in_memory() -> StorageResult<Self>;
}
