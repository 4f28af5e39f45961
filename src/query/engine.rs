//! QueryEngine: entry point for graph queries

use super::learning::{LearningPathQuery, DEFAULT_LEARNING_DEPTH};
use super::path::PathQuery;
use super::stats::{connected_components, StatisticsQuery};
use super::types::{GraphStatistics, LearningPath, PathResult, QueryResult};
use crate::graph::{Node, NodeId, Relationship};
use crate::storage::{Direction, GraphStore, NodeFilter, RelationshipFilter};
use std::sync::Arc;

/// Runs queries against whatever store it was built with
///
/// Holds no graph state of its own: every call re-reads the store, so
/// results always reflect the current contents.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn GraphStore>,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine").finish_non_exhaustive()
    }
}

impl QueryEngine {
    /// Create a new QueryEngine over a store
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    /// Shortest route between two nodes, ignoring edge direction
    pub fn shortest_path(&self, source: &NodeId, target: &NodeId) -> QueryResult<PathResult> {
        PathQuery::between(source.clone(), target.clone()).execute(self.store())
    }

    /// Prerequisite chain from `start`, `max_depth` defaulting to
    /// [`DEFAULT_LEARNING_DEPTH`]
    pub fn learning_path(&self, start: &NodeId, max_depth: Option<usize>) -> QueryResult<LearningPath> {
        LearningPathQuery::from(start.clone())
            .depth(max_depth.unwrap_or(DEFAULT_LEARNING_DEPTH))
            .execute(self.store())
    }

    /// Whole-graph counts
    pub fn statistics(&self) -> QueryResult<GraphStatistics> {
        StatisticsQuery::new().execute(self.store())
    }

    /// Filtered node listing
    pub fn search(&self, filter: &NodeFilter) -> QueryResult<Vec<Node>> {
        Ok(self.store.list_nodes(filter)?)
    }

    /// Filtered relationship listing
    pub fn relationships(&self, filter: &RelationshipFilter) -> QueryResult<Vec<Relationship>> {
        Ok(self.store.list_relationships(filter)?)
    }

    /// Relationships around a node paired with the node at the other end
    pub fn neighbors(&self, id: &NodeId, direction: Direction) -> QueryResult<Vec<(Relationship, Node)>> {
        Ok(self.store.adjacent(id, direction)?)
    }

    /// Weakly connected components, as lists of node ids
    pub fn connected_components(&self) -> QueryResult<Vec<Vec<NodeId>>> {
        let node_ids = self.store.all_node_ids()?;
        let relationships = self.store.all_relationships()?;
        Ok(connected_components(&node_ids, &relationships))
    }
}
