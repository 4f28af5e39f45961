//! Storage backends for the concept graph
//!
//! Every backend implements the `GraphStore` trait and must answer the same
//! operations with the same results. `MemoryStore` keeps the graph in
//! process; `SqliteStore` persists it to a database file.

mod memory;
mod retry;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use retry::RetryConfig;
pub use sqlite::{SqliteOptions, SqliteStore};
pub use traits::{
    Direction, EntityKind, GraphStore, NodeFilter, OpenStore, RelationshipFilter, StorageError,
    StorageResult,
};
