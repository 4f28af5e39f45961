//! Shortest path over the undirected view of the graph

use super::types::{PathResult, QueryError, QueryResult};
use crate::graph::{Node, NodeId, Relationship};
use crate::storage::{Direction, GraphStore};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Query for the shortest route between two nodes
///
/// Relationships are crossed regardless of their declared direction. Among
/// equal-length routes the first one discovered wins, which is stable
/// because `adjacent` reports edges in insertion order.
#[derive(Debug, Clone)]
pub struct PathQuery {
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    /// Optional cap on the number of hops
    pub max_length: Option<usize>,
}

impl PathQuery {
    /// Create a new path query between two nodes
    pub fn between(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            max_length: None,
        }
    }

    /// Give up on routes longer than `max_length` hops
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Execute the path query (BFS for shortest path)
    pub fn execute(&self, store: &dyn GraphStore) -> QueryResult<PathResult> {
        let source = store.get_node(&self.source)?;
        store.get_node(&self.target)?;

        if self.source == self.target {
            return Ok(PathResult::new(vec![source], Vec::new()));
        }

        let mut seen: HashMap<NodeId, Node> = HashMap::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut predecessors: HashMap<NodeId, (NodeId, Relationship)> = HashMap::new();
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();

        visited.insert(self.source.clone());
        seen.insert(self.source.clone(), source);
        queue.push_back((self.source.clone(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if self.max_length.is_some_and(|max| depth >= max) {
                continue;
            }

            for (rel, neighbor) in store.adjacent(&current, Direction::Both)? {
                if !visited.insert(neighbor.id.clone()) {
                    continue;
                }

                let neighbor_id = neighbor.id.clone();
                predecessors.insert(neighbor_id.clone(), (current.clone(), rel));
                seen.insert(neighbor_id.clone(), neighbor);

                if neighbor_id == self.target {
                    let path = Self::reconstruct(&self.target, &predecessors, &mut seen);
                    debug!(
                        source = %self.source,
                        target = %self.target,
                        length = path.length,
                        "found shortest path"
                    );
                    return Ok(path);
                }
                queue.push_back((neighbor_id, depth + 1));
            }
        }

        Err(QueryError::NoPath {
            from: self.source.clone(),
            to: self.target.clone(),
        })
    }

    /// Walk the predecessor chain back from the target
    fn reconstruct(
        target: &NodeId,
        predecessors: &HashMap<NodeId, (NodeId, Relationship)>,
        seen: &mut HashMap<NodeId, Node>,
    ) -> PathResult {
        let mut nodes: Vec<Node> = Vec::new();
        let mut relationships: Vec<Relationship> = Vec::new();
        let mut current = target.clone();

        while let Some((pred, rel)) = predecessors.get(&current) {
            if let Some(node) = seen.remove(&current) {
                nodes.push(node);
            }
            relationships.push(rel.clone());
            current = pred.clone();
        }
        if let Some(node) = seen.remove(&current) {
            nodes.push(node);
        }

        nodes.reverse();
        relationships.reverse();
        PathResult::new(nodes, relationships)
    }
}
