//! Graph building utilities for integration tests

use conceptgraph::{
    DifficultyLevel, EntityMetadata, GraphStore, MemoryStore, Node, NodeType, OpenStore,
    Relationship, RelationshipType, SqliteStore,
};
use std::sync::Arc;
use tempfile::TempDir;

/// A named store under test
///
/// Keeps the temporary directory alive for as long as the store is used.
pub struct Backend {
    pub name: &'static str,
    pub store: Arc<dyn GraphStore>,
    _dir: Option<TempDir>,
}

/// One fresh, empty store per backend
pub fn backends() -> Vec<Backend> {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let sqlite =
        SqliteStore::open(dir.path().join("graph.db")).expect("Failed to open sqlite store");

    vec![
        Backend {
            name: "memory",
            store: Arc::new(MemoryStore::new()),
            _dir: None,
        },
        Backend {
            name: "sqlite",
            store: Arc::new(sqlite),
            _dir: Some(dir),
        },
    ]
}

/// Fluent helper for populating a store
pub struct GraphBuilder<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    pub fn node(self, node: Node) -> Self {
        self.store
            .create_node(node)
            .expect("Failed to create node");
        self
    }

    pub fn concept(self, id: &str) -> Self {
        self.node(Node::new(id, id, NodeType::Concept))
    }

    pub fn edge(self, id: &str, source: &str, target: &str, relationship_type: RelationshipType) -> Self {
        self.store
            .create_relationship(Relationship::new(id, source, target, relationship_type))
            .expect("Failed to create relationship");
        self
    }

    pub fn depends_on(self, id: &str, source: &str, target: &str) -> Self {
        self.edge(id, source, target, RelationshipType::DependsOn)
    }
}

/// basic_types -> pointer -> smart_pointer, all `depends_on`
pub fn learning_scenario(store: &dyn GraphStore) {
    GraphBuilder::new(store)
        .concept("basic_types")
        .concept("pointer")
        .concept("smart_pointer")
        .depends_on("r1", "basic_types", "pointer")
        .depends_on("r2", "pointer", "smart_pointer");
}

/// A small C++ curriculum with cycles, a self-loop, mixed edge types and
/// an isolated node
pub fn cpp_curriculum(store: &dyn GraphStore) {
    let cpp = |id: &str, name: &str, level: DifficultyLevel| {
        Node::new(id, name, NodeType::Concept)
            .with_language("cpp")
            .with_category("core")
            .with_difficulty(level)
    };

    GraphBuilder::new(store)
        .node(Node::new("cpp", "C++", NodeType::Language).with_description("Systems programming language"))
        .node(cpp("basic_types", "Basic types", DifficultyLevel::Beginner))
        .node(cpp("pointer", "Pointer", DifficultyLevel::Intermediate).with_description("Holds a memory address"))
        .node(cpp("reference", "Reference", DifficultyLevel::Intermediate))
        .node(cpp("smart_pointer", "Smart pointer", DifficultyLevel::Advanced).with_tag("raii"))
        .node(cpp("raii", "RAII", DifficultyLevel::Advanced))
        .node(cpp("templates", "Templates", DifficultyLevel::Expert))
        .node(Node::new("stl", "Standard Template Library", NodeType::Library).with_language("cpp"))
        .node(Node::new("gcc", "GCC", NodeType::Tool).with_description("Compiler for C and C++"))
        .node(Node::new("git", "Git", NodeType::Tool))
        .edge("e01", "basic_types", "cpp", RelationshipType::BelongsTo)
        .depends_on("e02", "basic_types", "pointer")
        .depends_on("e03", "basic_types", "reference")
        .edge("e04", "pointer", "smart_pointer", RelationshipType::BuildsUpon)
        .edge("e05", "raii", "smart_pointer", RelationshipType::RelatedTo)
        .depends_on("e06", "smart_pointer", "templates")
        .edge("e07", "templates", "stl", RelationshipType::LearningPath)
        .edge("e08", "stl", "basic_types", RelationshipType::Prerequisite)
        .edge("e09", "gcc", "cpp", RelationshipType::Other("compiles".into()))
        .edge("e10", "reference", "reference", RelationshipType::SimilarTo)
        .edge("e11", "reference", "pointer", RelationshipType::ContrastsWith);
}

/// A node with its timestamps cleared, for comparing stores that stamped
/// updates at different instants
pub fn normalized(mut node: Node) -> Node {
    node.metadata = EntityMetadata::default();
    node
}

/// A relationship with its timestamps cleared
pub fn normalized_relationship(mut relationship: Relationship) -> Relationship {
    relationship.metadata = EntityMetadata::default();
    relationship
}
