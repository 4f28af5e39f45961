//! JSON import/export of whole graphs
//!
//! A document is `{ metadata, nodes, relationships }`. Importing replays the
//! document as `create_node` calls followed by `create_relationship` calls,
//! so exporting a graph and importing it into an empty store reproduces the
//! same nodes, relationships and adjacency.

use crate::graph::{Node, NodeId, Relationship, RelationshipId};
use crate::storage::{GraphStore, NodeFilter, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Errors reading or writing a graph document
#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Summary block at the top of a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_nodes: usize,
    #[serde(default)]
    pub total_relationships: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A serialized graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// Problems found by [`GraphDocument::validate`]
///
/// Errors will make the matching items fail on import; warnings will not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentIssues {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl DocumentIssues {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Nodes created
    pub nodes: usize,
    /// Relationships created
    pub relationships: usize,
    /// One message per item that could not be stored
    pub errors: Vec<String>,
}

impl GraphDocument {
    /// Read a document from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InterchangeError> {
        let file = File::open(path.as_ref())?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Write the document as pretty-printed JSON
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), InterchangeError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Check the document before importing it
    ///
    /// Catches what the store would reject: invalid entities, ids used
    /// twice, and relationships whose endpoints are not in the document.
    pub fn validate(&self) -> DocumentIssues {
        let mut issues = DocumentIssues::default();

        match self.metadata {
            None => issues.warnings.push("missing metadata".to_string()),
            Some(ref meta) => {
                if meta.total_nodes != self.nodes.len() {
                    issues.warnings.push(format!(
                        "metadata declares {} nodes, document has {}",
                        meta.total_nodes,
                        self.nodes.len()
                    ));
                }
                if meta.total_relationships != self.relationships.len() {
                    issues.warnings.push(format!(
                        "metadata declares {} relationships, document has {}",
                        meta.total_relationships,
                        self.relationships.len()
                    ));
                }
            }
        }
        if self.relationships.is_empty() && !self.nodes.is_empty() {
            issues.warnings.push("document has no relationships".to_string());
        }

        let mut node_ids: HashSet<&NodeId> = HashSet::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if let Err(e) = node.validate() {
                issues.errors.push(format!("nodes[{i}]: {e}"));
            }
            if !node_ids.insert(&node.id) {
                issues.errors.push(format!("nodes[{i}]: duplicate id '{}'", node.id));
            }
        }

        let mut rel_ids: HashSet<&RelationshipId> = HashSet::new();
        for (i, rel) in self.relationships.iter().enumerate() {
            if let Err(e) = rel.validate() {
                issues.errors.push(format!("relationships[{i}]: {e}"));
            }
            if !rel_ids.insert(&rel.id) {
                issues
                    .errors
                    .push(format!("relationships[{i}]: duplicate id '{}'", rel.id));
            }
            for endpoint in [&rel.source_id, &rel.target_id] {
                if !node_ids.contains(endpoint) {
                    issues.errors.push(format!(
                        "relationships[{i}]: unknown node '{endpoint}'"
                    ));
                }
            }
            if rel.source_id == rel.target_id {
                issues
                    .warnings
                    .push(format!("relationships[{i}]: self-loop on '{}'", rel.source_id));
            }
        }

        issues
    }
}

/// Snapshot the whole store, in insertion order
pub fn export_graph(store: &dyn GraphStore) -> StorageResult<GraphDocument> {
    let nodes = store.list_nodes(&NodeFilter::new())?;
    let relationships = store.all_relationships()?;

    info!(
        nodes = nodes.len(),
        relationships = relationships.len(),
        "exported graph"
    );
    Ok(GraphDocument {
        metadata: Some(DocumentMetadata {
            export_date: Some(Utc::now()),
            total_nodes: nodes.len(),
            total_relationships: relationships.len(),
            description: None,
        }),
        nodes,
        relationships,
    })
}

/// Replay a document into a store
///
/// Nodes go in first so relationships can find their endpoints. An item the
/// store rejects is recorded in the report and the import carries on.
pub fn import_graph(store: &dyn GraphStore, document: &GraphDocument) -> ImportReport {
    let mut report = ImportReport::default();

    for (i, node) in document.nodes.iter().enumerate() {
        match store.create_node(node.clone()) {
            Ok(_) => report.nodes += 1,
            Err(e) => {
                warn!(index = i, node_id = %node.id, error = %e, "skipped node");
                report.errors.push(format!("nodes[{i}] '{}': {e}", node.id));
            }
        }
    }

    for (i, rel) in document.relationships.iter().enumerate() {
        match store.create_relationship(rel.clone()) {
            Ok(_) => report.relationships += 1,
            Err(e) => {
                warn!(index = i, relationship_id = %rel.id, error = %e, "skipped relationship");
                report
                    .errors
                    .push(format!("relationships[{i}] '{}': {e}", rel.id));
            }
        }
    }

    info!(
        nodes = report.nodes,
        relationships = report.relationships,
        errors = report.errors.len(),
        "imported graph"
    );
    report
}

/// Clear the store, then import the document into it
///
/// Unlike [`import_graph`], ids already in the store cannot collide with the
/// document's.
pub fn replace_graph(
    store: &dyn GraphStore,
    document: &GraphDocument,
) -> StorageResult<ImportReport> {
    store.clear()?;
    Ok(import_graph(store, document))
}
