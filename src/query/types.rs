//! Query types and result structures

use crate::graph::{Node, NodeId, Relationship};
use crate::storage::StorageError;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by query operations
///
/// Store failures pass through unchanged.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("No path between {from} and {to}")]
    NoPath { from: NodeId, to: NodeId },
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// A route between two nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    /// Nodes from source to target (inclusive)
    pub nodes: Vec<Node>,
    /// Relationships crossed, one per hop
    pub relationships: Vec<Relationship>,
    /// Number of hops
    pub length: usize,
}

impl PathResult {
    pub fn new(nodes: Vec<Node>, relationships: Vec<Relationship>) -> Self {
        let length = relationships.len();
        Self {
            nodes,
            relationships,
            length,
        }
    }

    /// Ids of the nodes along the path
    pub fn node_ids(&self) -> Vec<&NodeId> {
        self.nodes.iter().map(|n| &n.id).collect()
    }
}

/// One node reached by a learning-path traversal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningStep {
    pub node: Node,
    /// Hops from the start node
    pub depth: usize,
    /// The relationship that first reached this node (None for the start)
    pub via: Option<Relationship>,
}

/// Prerequisite ordering derived from a starting concept
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningPath {
    /// Starting node
    pub origin: NodeId,
    /// Steps in breadth-first order; the start is always first
    pub steps: Vec<LearningStep>,
}

impl LearningPath {
    /// Nodes in the order they should be learned
    pub fn nodes(&self) -> Vec<&Node> {
        self.steps.iter().map(|s| &s.node).collect()
    }

    /// Ids in learning order
    pub fn node_ids(&self) -> Vec<&NodeId> {
        self.steps.iter().map(|s| &s.node.id).collect()
    }

    /// Deepest level reached
    pub fn max_depth(&self) -> usize {
        self.steps.iter().map(|s| s.depth).max().unwrap_or(0)
    }
}

/// Aggregate counts over the whole graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub relationship_count: usize,
    pub counts_by_node_type: BTreeMap<String, usize>,
    pub counts_by_relationship_type: BTreeMap<String, usize>,
    pub counts_by_difficulty_level: BTreeMap<String, usize>,
    /// Nodes grouped by language tag; untagged nodes are not counted
    pub counts_by_language: BTreeMap<String, usize>,
    /// Weakly connected components
    pub component_count: usize,
}
