//! In-memory storage backend
//!
//! Keeps nodes and relationships in insertion-ordered maps plus an explicit
//! adjacency index (node id -> incident relationship ids). Cascade deletes
//! walk the index, so removing a node costs O(degree) rather than a scan of
//! every relationship.
//!
//! Invariant: after any sequence of operations, the adjacency entry for a
//! node holds exactly the ids of the stored relationships whose source or
//! target is that node.

use super::traits::{
    Direction, GraphStore, NodeFilter, RelationshipFilter, StorageError, StorageResult,
};
use crate::graph::{Node, NodeId, NodeUpdate, Relationship, RelationshipId};
use indexmap::{IndexMap, IndexSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Incident relationship ids for one node
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Adjacency {
    outgoing: IndexSet<RelationshipId>,
    incoming: IndexSet<RelationshipId>,
}

#[derive(Debug, Default)]
struct Graph {
    nodes: IndexMap<NodeId, Node>,
    relationships: IndexMap<RelationshipId, Relationship>,
    adjacency: IndexMap<NodeId, Adjacency>,
}

impl Graph {
    fn node(&self, id: &NodeId) -> StorageResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| StorageError::node_not_found(id))
    }

    fn remove_relationship(&mut self, id: &RelationshipId) -> Option<Relationship> {
        let rel = self.relationships.shift_remove(id)?;
        if let Some(adj) = self.adjacency.get_mut(&rel.source_id) {
            adj.outgoing.shift_remove(id);
        }
        if let Some(adj) = self.adjacency.get_mut(&rel.target_id) {
            adj.incoming.shift_remove(id);
        }
        Some(rel)
    }

    /// Incident relationship ids in the order `adjacent` reports them
    ///
    /// Adjacency sets are appended on insert and shift-removed on delete,
    /// so their order matches relationship insertion order.
    fn incident(&self, id: &NodeId, direction: Direction) -> Vec<&RelationshipId> {
        let Some(adj) = self.adjacency.get(id) else {
            return Vec::new();
        };
        match direction {
            Direction::Outgoing => adj.outgoing.iter().collect(),
            Direction::Incoming => adj.incoming.iter().collect(),
            Direction::Both => {
                let mut ids: Vec<&RelationshipId> = adj.outgoing.iter().collect();
                // A self-loop already appeared as outgoing
                ids.extend(adj.incoming.iter().filter(|r| !adj.outgoing.contains(*r)));
                ids
            }
        }
    }
}

/// Graph store held entirely in process memory
///
/// Readers share the lock; every mutation takes it exclusively, so a
/// cascade delete never interleaves with another operation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    graph: RwLock<Graph>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Graph>> {
        self.graph.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Graph>> {
        self.graph.write().map_err(|_| StorageError::LockPoisoned)
    }

    /// Verify the adjacency index against the stored relationships
    ///
    /// Returns a description of the first mismatch found.
    pub fn check_integrity(&self) -> StorageResult<Result<(), String>> {
        let graph = self.read()?;

        if graph.adjacency.len() != graph.nodes.len() {
            return Ok(Err(format!(
                "adjacency has {} entries for {} nodes",
                graph.adjacency.len(),
                graph.nodes.len()
            )));
        }

        for id in graph.nodes.keys() {
            let expected = Adjacency {
                outgoing: graph
                    .relationships
                    .values()
                    .filter(|r| &r.source_id == id)
                    .map(|r| r.id.clone())
                    .collect(),
                incoming: graph
                    .relationships
                    .values()
                    .filter(|r| &r.target_id == id)
                    .map(|r| r.id.clone())
                    .collect(),
            };
            match graph.adjacency.get(id) {
                Some(actual) if actual == &expected => {}
                Some(actual) => {
                    return Ok(Err(format!(
                        "adjacency for {id} is {actual:?}, expected {expected:?}"
                    )))
                }
                None => return Ok(Err(format!("no adjacency entry for {id}"))),
            }
        }

        Ok(Ok(()))
    }
}

impl GraphStore for MemoryStore {
    // === Node Operations ===

    fn create_node(&self, node: Node) -> StorageResult<Node> {
        node.validate()?;
        let mut graph = self.write()?;

        if graph.nodes.contains_key(&node.id) {
            return Err(StorageError::duplicate_node(&node.id));
        }

        graph.adjacency.insert(node.id.clone(), Adjacency::default());
        graph.nodes.insert(node.id.clone(), node.clone());
        info!(node_id = %node.id, "created node");
        Ok(node)
    }

    fn get_node(&self, id: &NodeId) -> StorageResult<Node> {
        self.read()?.node(id).cloned()
    }

    fn update_node(&self, id: &NodeId, update: NodeUpdate) -> StorageResult<Node> {
        let mut graph = self.write()?;
        let node = graph
            .nodes
            .get_mut(id)
            .ok_or_else(|| StorageError::node_not_found(id))?;

        node.apply(update)?;
        info!(node_id = %id, "updated node");
        Ok(node.clone())
    }

    fn delete_node(&self, id: &NodeId) -> StorageResult<()> {
        let mut graph = self.write()?;
        let adj = graph
            .adjacency
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::node_not_found(id))?;

        let mut removed = 0;
        for rel_id in adj.outgoing.iter().chain(adj.incoming.iter()) {
            if graph.remove_relationship(rel_id).is_some() {
                removed += 1;
            }
        }

        graph.adjacency.shift_remove(id);
        graph.nodes.shift_remove(id);
        info!(node_id = %id, relationships = removed, "deleted node");
        Ok(())
    }

    fn list_nodes(&self, filter: &NodeFilter) -> StorageResult<Vec<Node>> {
        let graph = self.read()?;
        let matches = graph.nodes.values().filter(|n| filter.matches(n)).cloned();

        let nodes: Vec<Node> = match filter.limit {
            Some(limit) => matches.take(limit).collect(),
            None => matches.collect(),
        };
        debug!(count = nodes.len(), "listed nodes");
        Ok(nodes)
    }

    // === Relationship Operations ===

    fn create_relationship(&self, relationship: Relationship) -> StorageResult<Relationship> {
        relationship.validate()?;
        let mut graph = self.write()?;

        if graph.relationships.contains_key(&relationship.id) {
            return Err(StorageError::duplicate_relationship(&relationship.id));
        }
        for endpoint in [&relationship.source_id, &relationship.target_id] {
            if !graph.nodes.contains_key(endpoint) {
                return Err(StorageError::InvalidEndpoint {
                    relationship: relationship.id.to_string(),
                    node: endpoint.to_string(),
                });
            }
        }

        let id = relationship.id.clone();
        if let Some(adj) = graph.adjacency.get_mut(&relationship.source_id) {
            adj.outgoing.insert(id.clone());
        }
        if let Some(adj) = graph.adjacency.get_mut(&relationship.target_id) {
            adj.incoming.insert(id.clone());
        }
        graph.relationships.insert(id, relationship.clone());
        info!(
            relationship_id = %relationship.id,
            source = %relationship.source_id,
            target = %relationship.target_id,
            "created relationship"
        );
        Ok(relationship)
    }

    fn get_relationship(&self, id: &RelationshipId) -> StorageResult<Relationship> {
        self.read()?
            .relationships
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::relationship_not_found(id))
    }

    fn delete_relationship(&self, id: &RelationshipId) -> StorageResult<()> {
        let mut graph = self.write()?;
        graph
            .remove_relationship(id)
            .ok_or_else(|| StorageError::relationship_not_found(id))?;
        info!(relationship_id = %id, "deleted relationship");
        Ok(())
    }

    // === Adjacency & Enumeration ===

    fn adjacent(&self, id: &NodeId, direction: Direction) -> StorageResult<Vec<(Relationship, Node)>> {
        let graph = self.read()?;
        graph.node(id)?;

        graph
            .incident(id, direction)
            .into_iter()
            .map(|rel_id| {
                let rel = graph
                    .relationships
                    .get(rel_id)
                    .ok_or_else(|| StorageError::relationship_not_found(rel_id))?;
                let other = graph.node(rel.other_end(id))?;
                Ok((rel.clone(), other.clone()))
            })
            .collect()
    }

    fn all_node_ids(&self) -> StorageResult<Vec<NodeId>> {
        Ok(self.read()?.nodes.keys().cloned().collect())
    }

    fn all_relationships(&self) -> StorageResult<Vec<Relationship>> {
        Ok(self.read()?.relationships.values().cloned().collect())
    }

    fn list_relationships(&self, filter: &RelationshipFilter) -> StorageResult<Vec<Relationship>> {
        let graph = self.read()?;

        // An endpoint narrows the scan to that node's adjacency
        let candidates: Vec<&Relationship> = match (&filter.source, &filter.target) {
            (Some(id), _) => graph
                .incident(id, Direction::Outgoing)
                .into_iter()
                .filter_map(|rel_id| graph.relationships.get(rel_id))
                .collect(),
            (None, Some(id)) => graph
                .incident(id, Direction::Incoming)
                .into_iter()
                .filter_map(|rel_id| graph.relationships.get(rel_id))
                .collect(),
            (None, None) => graph.relationships.values().collect(),
        };

        Ok(candidates
            .into_iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut graph = self.write()?;
        let (nodes, relationships) = (graph.nodes.len(), graph.relationships.len());
        *graph = Graph::default();
        info!(nodes, relationships, "cleared store");
        Ok(())
    }

    fn node_count(&self) -> StorageResult<usize> {
        Ok(self.read()?.nodes.len())
    }

    fn relationship_count(&self) -> StorageResult<usize> {
        Ok(self.read()?.relationships.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeType, RelationshipType};

    fn concept(id: &str) -> Node {
        Node::new(id, id, NodeType::Concept)
    }

    fn depends(id: &str, source: &str, target: &str) -> Relationship {
        Relationship::new(id, source, target, RelationshipType::DependsOn)
    }

    fn create_test_store() -> MemoryStore {
        let store = MemoryStore::new();
        for id in ["a", "b", "c"] {
            store.create_node(concept(id)).unwrap();
        }
        store.create_relationship(depends("ab", "a", "b")).unwrap();
        store.create_relationship(depends("bc", "b", "c")).unwrap();
        store.create_relationship(depends("ca", "c", "a")).unwrap();
        store
    }

    #[test]
    fn test_create_and_get_node() {
        let store = MemoryStore::new();
        let node = concept("pointer").with_language("cpp");
        let created = store.create_node(node.clone()).unwrap();

        assert_eq!(created, node);
        assert_eq!(store.get_node(&NodeId::from("pointer")).unwrap(), node);
    }

    #[test]
    fn test_duplicate_node_leaves_original() {
        let store = MemoryStore::new();
        store.create_node(concept("a").with_description("first")).unwrap();

        let err = store
            .create_node(concept("a").with_description("second"))
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateId { .. }));

        let stored = store.get_node(&NodeId::from("a")).unwrap();
        assert_eq!(stored.description, "first");
    }

    #[test]
    fn test_invalid_node_is_rejected() {
        let store = MemoryStore::new();
        let err = store.create_node(concept("")).unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert_eq!(store.node_count().unwrap(), 0);
    }

    #[test]
    fn test_relationship_requires_endpoints() {
        let store = MemoryStore::new();
        store.create_node(concept("a")).unwrap();

        let err = store.create_relationship(depends("r", "a", "ghost")).unwrap_err();
        assert!(matches!(err, StorageError::InvalidEndpoint { .. }));
        assert_eq!(store.relationship_count().unwrap(), 0);
        assert_eq!(store.check_integrity().unwrap(), Ok(()));
    }

    #[test]
    fn test_duplicate_relationship_id() {
        let store = create_test_store();
        let err = store.create_relationship(depends("ab", "b", "a")).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateId { .. }));
    }

    #[test]
    fn test_delete_node_cascades_only_incident_relationships() {
        let store = create_test_store();
        store.create_node(concept("d")).unwrap();
        store.create_relationship(depends("cd", "c", "d")).unwrap();

        store.delete_node(&NodeId::from("a")).unwrap();

        let remaining: Vec<String> = store
            .all_relationships()
            .unwrap()
            .into_iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(remaining, vec!["bc", "cd"]);
        assert_eq!(store.check_integrity().unwrap(), Ok(()));
    }

    #[test]
    fn test_delete_missing_node() {
        let store = MemoryStore::new();
        let err = store.delete_node(&NodeId::from("nope")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_adjacent_both_directions() {
        let store = create_test_store();
        let adj = store.adjacent(&NodeId::from("a"), Direction::Both).unwrap();

        let pairs: Vec<(String, String)> = adj
            .iter()
            .map(|(r, n)| (r.id.to_string(), n.id.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![("ab".into(), "b".into()), ("ca".into(), "c".into())]
        );
    }

    #[test]
    fn test_adjacent_self_loop_listed_once() {
        let store = MemoryStore::new();
        store.create_node(concept("a")).unwrap();
        store
            .create_relationship(Relationship::new("aa", "a", "a", RelationshipType::RelatedTo))
            .unwrap();

        assert_eq!(store.adjacent(&NodeId::from("a"), Direction::Both).unwrap().len(), 1);
        assert_eq!(store.adjacent(&NodeId::from("a"), Direction::Outgoing).unwrap().len(), 1);
        assert_eq!(store.adjacent(&NodeId::from("a"), Direction::Incoming).unwrap().len(), 1);

        store.delete_node(&NodeId::from("a")).unwrap();
        assert_eq!(store.relationship_count().unwrap(), 0);
        assert_eq!(store.check_integrity().unwrap(), Ok(()));
    }

    #[test]
    fn test_adjacent_missing_node() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.adjacent(&NodeId::from("x"), Direction::Both),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_nodes_keeps_insertion_order_after_delete() {
        let store = MemoryStore::new();
        for id in ["z", "m", "a", "q"] {
            store.create_node(concept(id)).unwrap();
        }
        store.delete_node(&NodeId::from("m")).unwrap();

        let ids: Vec<String> = store
            .list_nodes(&NodeFilter::new())
            .unwrap()
            .into_iter()
            .map(|n| n.id.to_string())
            .collect();
        assert_eq!(ids, vec!["z", "a", "q"]);

        let limited = store.list_nodes(&NodeFilter::new().with_limit(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_update_node_keeps_adjacency() {
        let store = create_test_store();
        let updated = store
            .update_node(&NodeId::from("a"), NodeUpdate::new().name("Alpha"))
            .unwrap();

        assert_eq!(updated.name, "Alpha");
        assert_eq!(store.adjacent(&NodeId::from("a"), Direction::Both).unwrap().len(), 2);
    }

    #[test]
    fn test_update_node_rejects_id_change() {
        let store = create_test_store();
        let err = store
            .update_node(&NodeId::from("a"), NodeUpdate::new().with_id("z"))
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert!(store.get_node(&NodeId::from("a")).is_ok());
    }

    #[test]
    fn test_delete_relationship() {
        let store = create_test_store();
        store.delete_relationship(&RelationshipId::from("bc")).unwrap();

        assert!(store.get_relationship(&RelationshipId::from("bc")).is_err());
        assert!(store.delete_relationship(&RelationshipId::from("bc")).is_err());
        assert_eq!(store.check_integrity().unwrap(), Ok(()));
    }

    #[test]
    fn test_list_relationships_by_endpoint_and_type() {
        let store = create_test_store();
        store
            .create_relationship(Relationship::new("ac", "a", "c", RelationshipType::RelatedTo))
            .unwrap();

        let ids = |filter: RelationshipFilter| -> Vec<String> {
            store
                .list_relationships(&filter)
                .unwrap()
                .into_iter()
                .map(|r| r.id.to_string())
                .collect()
        };

        assert_eq!(ids(RelationshipFilter::new().from_node("a")), vec!["ab", "ac"]);
        assert_eq!(ids(RelationshipFilter::new().to_node("a")), vec!["ca"]);
        assert_eq!(
            ids(RelationshipFilter::new().with_type(RelationshipType::DependsOn)),
            vec!["ab", "bc", "ca"]
        );
        assert_eq!(
            ids(RelationshipFilter::new()
                .from_node("a")
                .with_type(RelationshipType::RelatedTo)),
            vec!["ac"]
        );
        assert!(ids(RelationshipFilter::new().from_node("ghost")).is_empty());
    }

    #[test]
    fn test_clear_resets_every_index() {
        let store = create_test_store();
        store.clear().unwrap();

        assert_eq!(store.node_count().unwrap(), 0);
        assert_eq!(store.relationship_count().unwrap(), 0);
        assert!(store.adjacent(&NodeId::from("a"), Direction::Both).is_err());
        assert_eq!(store.check_integrity().unwrap(), Ok(()));

        store.create_node(concept("a")).unwrap();
        store.create_node(concept("b")).unwrap();
        store.create_relationship(depends("ab", "a", "b")).unwrap();
        assert_eq!(store.adjacent(&NodeId::from("a"), Direction::Both).unwrap().len(), 1);
        assert_eq!(store.check_integrity().unwrap(), Ok(()));
    }
}
