//! Entity model: nodes, relationships and their validation rules

mod node;
mod relationship;
mod validation;

#[cfg(test)]
mod tests;

pub use node::{
    DifficultyLevel, EntityMetadata, Node, NodeId, NodeType, NodeUpdate, Properties,
    PropertyValue,
};
pub use relationship::{Relationship, RelationshipId, RelationshipType};
pub use validation::ValidationError;
