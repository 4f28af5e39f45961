//! Learning-path derivation along prerequisite edges

use super::types::{LearningPath, LearningStep, QueryResult};
use crate::graph::NodeId;
use crate::storage::{Direction, GraphStore};
use std::collections::HashSet;
use tracing::debug;

/// Depth used when the caller does not pick one
pub const DEFAULT_LEARNING_DEPTH: usize = 5;

/// Query for the concepts that build on a starting concept
///
/// Follows outgoing relationships whose type carries ordering semantics
/// (`depends_on`, `learning_path`, `builds_upon`, `prerequisite`),
/// breadth-first, so nodes closer to the start come earlier. Each node is
/// emitted once even when a cycle or a longer route reaches it again.
#[derive(Debug, Clone)]
pub struct LearningPathQuery {
    /// Starting node ID
    pub origin: NodeId,
    /// Maximum hops from the origin (0 = origin only)
    pub max_depth: usize,
}

impl LearningPathQuery {
    /// Create a new learning-path query from a starting node
    pub fn from(origin: impl Into<NodeId>) -> Self {
        Self {
            origin: origin.into(),
            max_depth: DEFAULT_LEARNING_DEPTH,
        }
    }

    /// Set the maximum traversal depth
    pub fn depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Execute the traversal against a store
    pub fn execute(&self, store: &dyn GraphStore) -> QueryResult<LearningPath> {
        let origin = store.get_node(&self.origin)?;

        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(self.origin.clone());

        let mut steps = vec![LearningStep {
            node: origin,
            depth: 0,
            via: None,
        }];
        let mut current_level: Vec<NodeId> = vec![self.origin.clone()];

        for depth in 1..=self.max_depth {
            if current_level.is_empty() {
                break;
            }

            let mut next_level: Vec<NodeId> = Vec::new();
            for node_id in &current_level {
                for (rel, neighbor) in store.adjacent(node_id, Direction::Outgoing)? {
                    if !rel.relationship_type.is_prerequisite() {
                        continue;
                    }
                    if !visited.insert(neighbor.id.clone()) {
                        continue;
                    }

                    next_level.push(neighbor.id.clone());
                    steps.push(LearningStep {
                        node: neighbor,
                        depth,
                        via: Some(rel),
                    });
                }
            }
            current_level = next_level;
        }

        debug!(
            origin = %self.origin,
            max_depth = self.max_depth,
            steps = steps.len(),
            "derived learning path"
        );
        Ok(LearningPath {
            origin: self.origin.clone(),
            steps,
        })
    }
}
