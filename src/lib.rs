//! conceptgraph: a knowledge graph of computer-science concepts
//!
//! Stores typed nodes (concepts, languages, technologies, libraries, tools)
//! linked by typed, directed relationships, and answers traversal queries
//! over them. The same queries run unchanged against an in-memory store or
//! a persistent SQLite-backed one.
//!
//! # Core Concepts
//!
//! - **Nodes**: entities with a type, optional language and difficulty
//! - **Relationships**: directed, typed, weighted edges between nodes
//! - **Stores**: backends behind the `GraphStore` trait
//! - **Queries**: shortest path, learning path, statistics, search
//!
//! # Example
//!
//! ```
//! use conceptgraph::{GraphStore, MemoryStore, Node, NodeType, QueryEngine, Relationship, RelationshipType};
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new();
//! store.create_node(Node::new("pointer", "Pointer", NodeType::Concept)).unwrap();
//! store.create_node(Node::new("smart_pointer", "Smart pointer", NodeType::Concept)).unwrap();
//! store
//!     .create_relationship(Relationship::between("pointer", "smart_pointer", RelationshipType::DependsOn))
//!     .unwrap();
//!
//! let engine = QueryEngine::new(Arc::new(store));
//! let path = engine.learning_path(&"pointer".into(), None).unwrap();
//! assert_eq!(path.steps.len(), 2);
//! ```

pub mod config;
mod graph;
pub mod interchange;
pub mod query;
pub mod storage;

pub use config::{BackendKind, Config, ConfigError};
pub use graph::{
    DifficultyLevel, EntityMetadata, Node, NodeId, NodeType, NodeUpdate, Properties,
    PropertyValue, Relationship, RelationshipId, RelationshipType, ValidationError,
};
pub use interchange::{export_graph, import_graph, replace_graph, GraphDocument, ImportReport};
pub use query::{
    GraphStatistics, LearningPath, LearningPathQuery, PathQuery, PathResult, QueryEngine,
    QueryError, QueryResult, StatisticsQuery, DEFAULT_LEARNING_DEPTH,
};
pub use storage::{
    Direction, GraphStore, MemoryStore, NodeFilter, OpenStore, RelationshipFilter, SqliteStore,
    StorageError, StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
