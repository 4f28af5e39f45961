//! Aggregate statistics and connectivity

use super::types::{GraphStatistics, QueryResult};
use crate::graph::{Node, NodeId, Relationship};
use crate::storage::{GraphStore, NodeFilter};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Query for whole-graph counts
///
/// Recomputed from the store on every call; nothing is cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsQuery;

impl StatisticsQuery {
    pub fn new() -> Self {
        Self
    }

    /// Execute a single enumeration pass and aggregate
    pub fn execute(&self, store: &dyn GraphStore) -> QueryResult<GraphStatistics> {
        let nodes = store.list_nodes(&NodeFilter::new())?;
        let relationships = store.all_relationships()?;

        let mut stats = GraphStatistics {
            node_count: nodes.len(),
            relationship_count: relationships.len(),
            ..Default::default()
        };

        for node in &nodes {
            tally(&mut stats, node);
        }
        for rel in &relationships {
            *stats
                .counts_by_relationship_type
                .entry(rel.relationship_type.to_string())
                .or_default() += 1;
        }
        let node_ids: Vec<NodeId> = nodes.into_iter().map(|n| n.id).collect();
        stats.component_count = count_components(&node_ids, &relationships);

        debug!(
            nodes = stats.node_count,
            relationships = stats.relationship_count,
            components = stats.component_count,
            "computed statistics"
        );
        Ok(stats)
    }
}

fn tally(stats: &mut GraphStatistics, node: &Node) {
    *stats
        .counts_by_node_type
        .entry(node.node_type.to_string())
        .or_default() += 1;
    if let Some(level) = node.difficulty_level {
        *stats
            .counts_by_difficulty_level
            .entry(level.to_string())
            .or_default() += 1;
    }
    if let Some(ref language) = node.language {
        *stats.counts_by_language.entry(language.clone()).or_default() += 1;
    }
}

/// Group nodes into weakly connected components
///
/// Components are listed in order of their first member's insertion, and
/// members keep insertion order within a component.
pub fn connected_components(
    node_ids: &[NodeId],
    relationships: &[Relationship],
) -> Vec<Vec<NodeId>> {
    let index: HashMap<&NodeId, usize> = node_ids.iter().enumerate().map(|(i, id)| (id, i)).collect();
    let mut sets = DisjointSet::new(node_ids.len());

    for rel in relationships {
        if let (Some(&a), Some(&b)) = (index.get(&rel.source_id), index.get(&rel.target_id)) {
            sets.union(a, b);
        }
    }

    // Roots are always the smallest index in their set
    let mut groups: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
    for (i, id) in node_ids.iter().enumerate() {
        let root = sets.find(i);
        groups.entry(root).or_default().push(id.clone());
    }
    groups.into_values().collect()
}

fn count_components(node_ids: &[NodeId], relationships: &[Relationship]) -> usize {
    connected_components(node_ids, relationships).len()
}

/// Union-find with path halving
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}
