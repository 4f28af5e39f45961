//! SQLite storage backend
//!
//! The persistent adapter: every store operation is translated into SQL and
//! run inside a single transaction, so a cascade delete either removes the
//! node with all of its relationships or changes nothing. Busy/locked/IO
//! failures are reported as connectivity errors and retried with backoff;
//! every other SQLite failure is a query error and surfaces at once.

use super::retry::RetryConfig;
use super::traits::{
    Direction, GraphStore, NodeFilter, OpenStore, RelationshipFilter, StorageError, StorageResult,
};
use crate::graph::{Node, NodeId, NodeUpdate, Relationship, RelationshipId};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

const NODE_COLUMNS: &str = "id, name, node_type, description, language, category, \
                            difficulty_level, tags_json, properties_json, metadata_json";

const RELATIONSHIP_COLUMNS: &str = "r.id, r.source_id, r.target_id, r.relationship_type, \
                                    r.description, r.weight, r.properties_json, r.metadata_json";

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure,
            ) => StorageError::Connectivity(e.to_string()),
            _ => StorageError::Query(e.to_string()),
        }
    }
}

/// Tuning for the persistent backend
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteOptions {
    /// How long one statement may wait on a locked database
    pub busy_timeout: Duration,
    /// Retry policy for connectivity failures
    pub retry: RetryConfig,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

/// Raw node columns, decoded into a `Node` outside the row callback
struct NodeRow {
    id: String,
    name: String,
    node_type: String,
    description: String,
    language: Option<String>,
    category: Option<String>,
    difficulty_level: Option<String>,
    tags_json: String,
    properties_json: String,
    metadata_json: String,
}

impl NodeRow {
    fn read(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            node_type: row.get(offset + 2)?,
            description: row.get(offset + 3)?,
            language: row.get(offset + 4)?,
            category: row.get(offset + 5)?,
            difficulty_level: row.get(offset + 6)?,
            tags_json: row.get(offset + 7)?,
            properties_json: row.get(offset + 8)?,
            metadata_json: row.get(offset + 9)?,
        })
    }

    fn into_node(self) -> StorageResult<Node> {
        Ok(Node {
            id: NodeId::from_string(self.id),
            name: self.name,
            node_type: self.node_type.parse()?,
            description: self.description,
            language: self.language,
            category: self.category,
            difficulty_level: self.difficulty_level.map(|d| d.parse()).transpose()?,
            tags: serde_json::from_str(&self.tags_json)?,
            properties: serde_json::from_str(&self.properties_json)?,
            metadata: serde_json::from_str(&self.metadata_json)?,
        })
    }
}

/// Raw relationship columns
struct RelationshipRow {
    id: String,
    source_id: String,
    target_id: String,
    relationship_type: String,
    description: String,
    weight: f64,
    properties_json: String,
    metadata_json: String,
}

impl RelationshipRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            source_id: row.get(1)?,
            target_id: row.get(2)?,
            relationship_type: row.get(3)?,
            description: row.get(4)?,
            weight: row.get(5)?,
            properties_json: row.get(6)?,
            metadata_json: row.get(7)?,
        })
    }

    fn into_relationship(self) -> StorageResult<Relationship> {
        Ok(Relationship {
            id: RelationshipId::from_string(self.id),
            source_id: NodeId::from_string(self.source_id),
            target_id: NodeId::from_string(self.target_id),
            relationship_type: self.relationship_type.parse()?,
            description: self.description,
            weight: self.weight,
            properties: serde_json::from_str(&self.properties_json)?,
            metadata: serde_json::from_str(&self.metadata_json)?,
        })
    }
}

/// SQLite-backed graph store
///
/// `seq` columns preserve insertion order so enumeration and adjacency
/// match the in-memory backend exactly. Thread-safe via internal mutex on
/// the connection; the database's own locking covers other processes.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    retry: RetryConfig,
}

impl SqliteStore {
    /// Open or create a store at `path` with explicit options
    pub fn open_with(path: impl AsRef<Path>, options: SqliteOptions) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = options.retry.run("open", || Ok(Connection::open(path)?))?;
        Self::configure(&conn, &options)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::init_schema(&conn)?;
        info!(path = %path.display(), "opened sqlite store");

        Ok(Self {
            conn: Mutex::new(conn),
            retry: options.retry,
        })
    }

    /// Create an in-memory SQLite store with explicit options
    pub fn open_in_memory_with(options: SqliteOptions) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn, &options)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            retry: options.retry,
        })
    }

    fn configure(conn: &Connection, options: &SqliteOptions) -> StorageResult<()> {
        conn.busy_timeout(options.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }

    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                node_type TEXT NOT NULL,
                description TEXT NOT NULL,
                language TEXT,
                category TEXT,
                difficulty_level TEXT,
                tags_json TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                metadata_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(node_type);
            CREATE INDEX IF NOT EXISTS idx_nodes_language ON nodes(language);

            CREATE TABLE IF NOT EXISTS relationships (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                source_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                target_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                relationship_type TEXT NOT NULL,
                description TEXT NOT NULL,
                weight REAL NOT NULL,
                properties_json TEXT NOT NULL,
                metadata_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_relationships_source ON relationships(source_id);
            CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships(target_id);
            CREATE INDEX IF NOT EXISTS idx_relationships_type ON relationships(relationship_type);
            "#,
        )?;
        Ok(())
    }

    /// Run `f` inside one transaction, retrying connectivity failures
    ///
    /// Domain errors returned by `f` roll the transaction back.
    fn transact<T, F>(&self, operation: &str, behavior: TransactionBehavior, f: F) -> StorageResult<T>
    where
        F: Fn(&Transaction<'_>) -> StorageResult<T>,
    {
        self.retry.run(operation, || {
            let mut conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            let tx = conn.transaction_with_behavior(behavior)?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    fn read<T, F>(&self, operation: &str, f: F) -> StorageResult<T>
    where
        F: Fn(&Transaction<'_>) -> StorageResult<T>,
    {
        self.transact(operation, TransactionBehavior::Deferred, f)
    }

    fn write<T, F>(&self, operation: &str, f: F) -> StorageResult<T>
    where
        F: Fn(&Transaction<'_>) -> StorageResult<T>,
    {
        self.transact(operation, TransactionBehavior::Immediate, f)
    }

    fn node_exists(tx: &Transaction<'_>, id: &NodeId) -> StorageResult<bool> {
        Ok(tx
            .query_row("SELECT 1 FROM nodes WHERE id = ?1", params![id.as_str()], |_| Ok(()))
            .optional()?
            .is_some())
    }

    fn relationship_exists(tx: &Transaction<'_>, id: &RelationshipId) -> StorageResult<bool> {
        Ok(tx
            .query_row(
                "SELECT 1 FROM relationships WHERE id = ?1",
                params![id.as_str()],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    fn load_node(tx: &Transaction<'_>, id: &NodeId) -> StorageResult<Node> {
        let row = tx
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1"),
                params![id.as_str()],
                |row| NodeRow::read(row, 0),
            )
            .optional()?;

        row.ok_or_else(|| StorageError::node_not_found(id))?
            .into_node()
    }

    fn write_node(tx: &Transaction<'_>, node: &Node, insert: bool) -> StorageResult<()> {
        let tags = serde_json::to_string(&node.tags)?;
        let properties = serde_json::to_string(&node.properties)?;
        let metadata = serde_json::to_string(&node.metadata)?;
        let difficulty = node.difficulty_level.map(|d| d.as_str());

        let sql = if insert {
            "INSERT INTO nodes (id, name, node_type, description, language, category,
                                difficulty_level, tags_json, properties_json, metadata_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        } else {
            "UPDATE nodes SET name = ?2, node_type = ?3, description = ?4, language = ?5,
                              category = ?6, difficulty_level = ?7, tags_json = ?8,
                              properties_json = ?9, metadata_json = ?10
             WHERE id = ?1"
        };

        tx.execute(
            sql,
            params![
                node.id.as_str(),
                node.name,
                node.node_type.as_str(),
                node.description,
                node.language,
                node.category,
                difficulty,
                tags,
                properties,
                metadata,
            ],
        )?;
        Ok(())
    }

    fn query_relationships(
        tx: &Transaction<'_>,
        sql: &str,
        node_id: &NodeId,
    ) -> StorageResult<Vec<(Relationship, Node)>> {
        let mut stmt = tx.prepare(sql)?;
        let rows = stmt.query_map(params![node_id.as_str()], |row| {
            Ok((RelationshipRow::read(row)?, NodeRow::read(row, 8)?))
        })?;

        let mut pairs = Vec::new();
        for row in rows {
            let (rel, node) = row?;
            pairs.push((rel.into_relationship()?, node.into_node()?));
        }
        Ok(pairs)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with(path, SqliteOptions::default())
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::open_in_memory_with(SqliteOptions::default())
    }
}

impl GraphStore for SqliteStore {
    // === Node Operations ===

    fn create_node(&self, node: Node) -> StorageResult<Node> {
        node.validate()?;
        self.write("create_node", |tx| {
            if Self::node_exists(tx, &node.id)? {
                return Err(StorageError::duplicate_node(&node.id));
            }
            Self::write_node(tx, &node, true)
        })?;
        info!(node_id = %node.id, "created node");
        Ok(node)
    }

    fn get_node(&self, id: &NodeId) -> StorageResult<Node> {
        self.read("get_node", |tx| Self::load_node(tx, id))
    }

    fn update_node(&self, id: &NodeId, update: NodeUpdate) -> StorageResult<Node> {
        let node = self.write("update_node", |tx| {
            let mut node = Self::load_node(tx, id)?;
            node.apply(update.clone())?;
            Self::write_node(tx, &node, false)?;
            Ok(node)
        })?;
        info!(node_id = %id, "updated node");
        Ok(node)
    }

    fn delete_node(&self, id: &NodeId) -> StorageResult<()> {
        let removed = self.write("delete_node", |tx| {
            if !Self::node_exists(tx, id)? {
                return Err(StorageError::node_not_found(id));
            }
            let removed = tx.execute(
                "DELETE FROM relationships WHERE source_id = ?1 OR target_id = ?1",
                params![id.as_str()],
            )?;
            tx.execute("DELETE FROM nodes WHERE id = ?1", params![id.as_str()])?;
            Ok(removed)
        })?;
        info!(node_id = %id, relationships = removed, "deleted node");
        Ok(())
    }

    fn list_nodes(&self, filter: &NodeFilter) -> StorageResult<Vec<Node>> {
        let nodes = self.read("list_nodes", |tx| {
            let mut sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE 1 = 1");
            let mut params_vec: Vec<String> = Vec::new();

            if let Some(node_type) = filter.node_type {
                params_vec.push(node_type.as_str().to_string());
                sql.push_str(&format!(" AND node_type = ?{}", params_vec.len()));
            }
            if let Some(ref language) = filter.language {
                params_vec.push(language.clone());
                sql.push_str(&format!(" AND language = ?{}", params_vec.len()));
            }
            sql.push_str(" ORDER BY seq");

            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(params_vec.iter()), |row| {
                NodeRow::read(row, 0)
            })?;

            // Text search and limit run in Rust so case folding matches
            // the in-memory backend (SQLite's lower() is ASCII-only).
            let mut nodes = Vec::new();
            for row in rows {
                if filter.limit.is_some_and(|limit| nodes.len() >= limit) {
                    break;
                }
                let node = row?.into_node()?;
                if filter.matches(&node) {
                    nodes.push(node);
                }
            }
            Ok(nodes)
        })?;
        debug!(count = nodes.len(), "listed nodes");
        Ok(nodes)
    }

    // === Relationship Operations ===

    fn create_relationship(&self, relationship: Relationship) -> StorageResult<Relationship> {
        relationship.validate()?;
        self.write("create_relationship", |tx| {
            if Self::relationship_exists(tx, &relationship.id)? {
                return Err(StorageError::duplicate_relationship(&relationship.id));
            }
            for endpoint in [&relationship.source_id, &relationship.target_id] {
                if !Self::node_exists(tx, endpoint)? {
                    return Err(StorageError::InvalidEndpoint {
                        relationship: relationship.id.to_string(),
                        node: endpoint.to_string(),
                    });
                }
            }

            tx.execute(
                "INSERT INTO relationships (id, source_id, target_id, relationship_type,
                                            description, weight, properties_json, metadata_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    relationship.id.as_str(),
                    relationship.source_id.as_str(),
                    relationship.target_id.as_str(),
                    relationship.relationship_type.as_str(),
                    relationship.description,
                    relationship.weight,
                    serde_json::to_string(&relationship.properties)?,
                    serde_json::to_string(&relationship.metadata)?,
                ],
            )?;
            Ok(())
        })?;
        info!(
            relationship_id = %relationship.id,
            source = %relationship.source_id,
            target = %relationship.target_id,
            "created relationship"
        );
        Ok(relationship)
    }

    fn get_relationship(&self, id: &RelationshipId) -> StorageResult<Relationship> {
        self.read("get_relationship", |tx| {
            let row = tx
                .query_row(
                    &format!("SELECT {RELATIONSHIP_COLUMNS} FROM relationships r WHERE r.id = ?1"),
                    params![id.as_str()],
                    RelationshipRow::read,
                )
                .optional()?;
            row.ok_or_else(|| StorageError::relationship_not_found(id))?
                .into_relationship()
        })
    }

    fn delete_relationship(&self, id: &RelationshipId) -> StorageResult<()> {
        self.write("delete_relationship", |tx| {
            let rows = tx.execute("DELETE FROM relationships WHERE id = ?1", params![id.as_str()])?;
            if rows == 0 {
                return Err(StorageError::relationship_not_found(id));
            }
            Ok(())
        })?;
        info!(relationship_id = %id, "deleted relationship");
        Ok(())
    }

    // === Adjacency & Enumeration ===

    fn adjacent(&self, id: &NodeId, direction: Direction) -> StorageResult<Vec<(Relationship, Node)>> {
        let outgoing = format!(
            "SELECT {RELATIONSHIP_COLUMNS}, n.{} FROM relationships r
             JOIN nodes n ON n.id = r.target_id
             WHERE r.source_id = ?1 ORDER BY r.seq",
            NODE_COLUMNS.replace(", ", ", n.")
        );
        let incoming = format!(
            "SELECT {RELATIONSHIP_COLUMNS}, n.{} FROM relationships r
             JOIN nodes n ON n.id = r.source_id
             WHERE r.target_id = ?1 ORDER BY r.seq",
            NODE_COLUMNS.replace(", ", ", n.")
        );

        self.read("adjacent", |tx| {
            if !Self::node_exists(tx, id)? {
                return Err(StorageError::node_not_found(id));
            }
            match direction {
                Direction::Outgoing => Self::query_relationships(tx, &outgoing, id),
                Direction::Incoming => Self::query_relationships(tx, &incoming, id),
                Direction::Both => {
                    let mut pairs = Self::query_relationships(tx, &outgoing, id)?;
                    // A self-loop already appeared as outgoing
                    pairs.extend(
                        Self::query_relationships(tx, &incoming, id)?
                            .into_iter()
                            .filter(|(rel, _)| &rel.source_id != id),
                    );
                    Ok(pairs)
                }
            }
        })
    }

    fn all_node_ids(&self) -> StorageResult<Vec<NodeId>> {
        self.read("all_node_ids", |tx| {
            let mut stmt = tx.prepare("SELECT id FROM nodes ORDER BY seq")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .map(|r| r.map(NodeId::from))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    fn all_relationships(&self) -> StorageResult<Vec<Relationship>> {
        self.read("all_relationships", |tx| {
            let mut stmt = tx.prepare(&format!(
                "SELECT {RELATIONSHIP_COLUMNS} FROM relationships r ORDER BY r.seq"
            ))?;
            let rows = stmt.query_map([], RelationshipRow::read)?;

            let mut relationships = Vec::new();
            for row in rows {
                relationships.push(row?.into_relationship()?);
            }
            Ok(relationships)
        })
    }

    fn list_relationships(&self, filter: &RelationshipFilter) -> StorageResult<Vec<Relationship>> {
        let relationships = self.read("list_relationships", |tx| {
            let mut sql = format!("SELECT {RELATIONSHIP_COLUMNS} FROM relationships r WHERE 1 = 1");
            let mut params_vec: Vec<String> = Vec::new();

            if let Some(ref relationship_type) = filter.relationship_type {
                params_vec.push(relationship_type.as_str().to_string());
                sql.push_str(&format!(" AND r.relationship_type = ?{}", params_vec.len()));
            }
            if let Some(ref source) = filter.source {
                params_vec.push(source.to_string());
                sql.push_str(&format!(" AND r.source_id = ?{}", params_vec.len()));
            }
            if let Some(ref target) = filter.target {
                params_vec.push(target.to_string());
                sql.push_str(&format!(" AND r.target_id = ?{}", params_vec.len()));
            }
            sql.push_str(" ORDER BY r.seq");

            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(params_vec.iter()),
                RelationshipRow::read,
            )?;

            let mut relationships = Vec::new();
            for row in rows {
                relationships.push(row?.into_relationship()?);
            }
            Ok(relationships)
        })?;
        debug!(count = relationships.len(), "listed relationships");
        Ok(relationships)
    }

    fn clear(&self) -> StorageResult<()> {
        let (nodes, relationships) = self.write("clear", |tx| {
            let relationships = tx.execute("DELETE FROM relationships", [])?;
            let nodes = tx.execute("DELETE FROM nodes", [])?;
            Ok((nodes, relationships))
        })?;
        info!(nodes, relationships, "cleared store");
        Ok(())
    }

    fn node_count(&self) -> StorageResult<usize> {
        self.read("node_count", |tx| {
            let count: i64 = tx.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    fn relationship_count(&self) -> StorageResult<usize> {
        self.read("relationship_count", |tx| {
            let count: i64 =
                tx.query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DifficultyLevel, NodeType, PropertyValue, RelationshipType};

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn create_test_node(id: &str, node_type: NodeType) -> Node {
        Node::new(id, id, node_type)
    }

    #[test]
    fn test_save_and_load_node() {
        let store = create_test_store();
        let node = create_test_node("smart_pointer", NodeType::Concept)
            .with_description("Owning pointer")
            .with_language("cpp")
            .with_category("memory")
            .with_difficulty(DifficultyLevel::Advanced)
            .with_tag("raii")
            .with_property("header", "<memory>")
            .with_property("since", PropertyValue::Int(2011))
            .with_property("ratio", PropertyValue::Float(0.5));

        store.create_node(node.clone()).unwrap();
        let loaded = store.get_node(&node.id).unwrap();

        assert_eq!(loaded, node);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let store = create_test_store();
        store
            .create_node(create_test_node("a", NodeType::Concept).with_description("first"))
            .unwrap();

        let err = store
            .create_node(create_test_node("a", NodeType::Tool))
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateId { .. }));
        assert_eq!(store.get_node(&NodeId::from("a")).unwrap().description, "first");
    }

    #[test]
    fn test_update_node_persists() {
        let store = create_test_store();
        store.create_node(create_test_node("a", NodeType::Concept)).unwrap();

        store
            .update_node(
                &NodeId::from("a"),
                NodeUpdate::new().description("updated").difficulty(Some(DifficultyLevel::Beginner)),
            )
            .unwrap();

        let loaded = store.get_node(&NodeId::from("a")).unwrap();
        assert_eq!(loaded.description, "updated");
        assert_eq!(loaded.difficulty_level, Some(DifficultyLevel::Beginner));
    }

    #[test]
    fn test_update_missing_node() {
        let store = create_test_store();
        let err = store
            .update_node(&NodeId::from("nope"), NodeUpdate::new().name("x"))
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_find_nodes_by_type_and_search() {
        let store = create_test_store();
        store
            .create_node(create_test_node("cpp", NodeType::Language).with_description("Systems language"))
            .unwrap();
        store
            .create_node(create_test_node("gcc", NodeType::Tool).with_description("Compiler for systems code"))
            .unwrap();
        store.create_node(create_test_node("rust", NodeType::Language)).unwrap();

        let languages = store
            .list_nodes(&NodeFilter::new().with_type(NodeType::Language))
            .unwrap();
        assert_eq!(languages.len(), 2);
        assert_eq!(languages[0].id.as_str(), "cpp");

        let systems = store.list_nodes(&NodeFilter::new().with_search("SYSTEMS")).unwrap();
        assert_eq!(systems.len(), 2);

        let limited = store
            .list_nodes(&NodeFilter::new().with_search("systems").with_limit(1))
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id.as_str(), "cpp");
    }

    #[test]
    fn test_relationship_with_missing_endpoint() {
        let store = create_test_store();
        store.create_node(create_test_node("a", NodeType::Concept)).unwrap();

        let err = store
            .create_relationship(Relationship::new("r", "a", "ghost", RelationshipType::Uses))
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_save_and_get_relationship() {
        let store = create_test_store();
        store.create_node(create_test_node("a", NodeType::Concept)).unwrap();
        store.create_node(create_test_node("b", NodeType::Concept)).unwrap();

        let rel = Relationship::new("r", "a", "b", RelationshipType::Other("inspired_by".into()))
            .with_weight(2.5)
            .with_description("loosely");
        store.create_relationship(rel.clone()).unwrap();

        assert_eq!(store.get_relationship(&rel.id).unwrap(), rel);
    }

    #[test]
    fn test_delete_node_cascades_edges() {
        let store = create_test_store();
        for id in ["a", "b", "c"] {
            store.create_node(create_test_node(id, NodeType::Concept)).unwrap();
        }
        store
            .create_relationship(Relationship::new("ab", "a", "b", RelationshipType::DependsOn))
            .unwrap();
        store
            .create_relationship(Relationship::new("bc", "b", "c", RelationshipType::DependsOn))
            .unwrap();

        store.delete_node(&NodeId::from("a")).unwrap();

        let remaining = store.all_relationships().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id.as_str(), "bc");
        assert!(store.get_node(&NodeId::from("a")).is_err());
    }

    #[test]
    fn test_adjacent_orders_outgoing_before_incoming() {
        let store = create_test_store();
        for id in ["x", "y", "z"] {
            store.create_node(create_test_node(id, NodeType::Concept)).unwrap();
        }
        store
            .create_relationship(Relationship::new("zx", "z", "x", RelationshipType::RelatedTo))
            .unwrap();
        store
            .create_relationship(Relationship::new("xy", "x", "y", RelationshipType::RelatedTo))
            .unwrap();

        let adj = store.adjacent(&NodeId::from("x"), Direction::Both).unwrap();
        let ids: Vec<(&str, &str)> = adj
            .iter()
            .map(|(r, n)| (r.id.as_str(), n.id.as_str()))
            .collect();
        assert_eq!(ids, vec![("xy", "y"), ("zx", "z")]);
    }

    #[test]
    fn test_reopen_file_preserves_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_node(create_test_node("a", NodeType::Concept)).unwrap();
            store.create_node(create_test_node("b", NodeType::Concept)).unwrap();
            store
                .create_relationship(Relationship::new("ab", "a", "b", RelationshipType::DependsOn))
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.node_count().unwrap(), 2);
        assert_eq!(store.relationship_count().unwrap(), 1);
        assert_eq!(
            store.all_node_ids().unwrap(),
            vec![NodeId::from("a"), NodeId::from("b")]
        );
    }

    #[test]
    fn test_sqlite_errors_classified() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(StorageError::from(busy).is_retryable());

        let constraint = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            None,
        );
        assert!(matches!(StorageError::from(constraint), StorageError::Query(_)));
    }

    #[test]
    fn test_locked_database_without_retry_fails_after_busy_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        let options = SqliteOptions {
            busy_timeout: Duration::from_millis(20),
            retry: RetryConfig::no_retry(),
        };
        let store = SqliteStore::open_with(&path, options).unwrap();

        let locker = Connection::open(&path).unwrap();
        locker.execute_batch("BEGIN IMMEDIATE;").unwrap();

        let err = store
            .create_node(create_test_node("a", NodeType::Concept))
            .unwrap_err();
        assert!(matches!(err, StorageError::Connectivity(_)), "{err:?}");

        locker.execute_batch("ROLLBACK;").unwrap();
        store.create_node(create_test_node("a", NodeType::Concept)).unwrap();
        assert_eq!(store.node_count().unwrap(), 1);
    }

    #[test]
    fn test_clear_and_reuse() {
        let store = create_test_store();
        for id in ["a", "b"] {
            store.create_node(create_test_node(id, NodeType::Concept)).unwrap();
        }
        store
            .create_relationship(Relationship::new("ab", "a", "b", RelationshipType::DependsOn))
            .unwrap();

        store.clear().unwrap();
        assert_eq!(store.node_count().unwrap(), 0);
        assert_eq!(store.relationship_count().unwrap(), 0);

        store.create_node(create_test_node("b", NodeType::Concept)).unwrap();
        store.create_node(create_test_node("a", NodeType::Concept)).unwrap();
        assert_eq!(
            store.all_node_ids().unwrap(),
            vec![NodeId::from("b"), NodeId::from("a")]
        );
    }

    #[test]
    fn test_list_relationships_pushes_filter_into_sql() {
        let store = create_test_store();
        for id in ["a", "b", "c"] {
            store.create_node(create_test_node(id, NodeType::Concept)).unwrap();
        }
        for (id, src, tgt, t) in [
            ("ab", "a", "b", RelationshipType::DependsOn),
            ("ac", "a", "c", RelationshipType::Other("inspired_by".into())),
            ("bc", "b", "c", RelationshipType::DependsOn),
        ] {
            store
                .create_relationship(Relationship::new(id, src, tgt, t))
                .unwrap();
        }

        let ids = |filter: RelationshipFilter| -> Vec<String> {
            store
                .list_relationships(&filter)
                .unwrap()
                .into_iter()
                .map(|r| r.id.to_string())
                .collect()
        };
        assert_eq!(
            ids(RelationshipFilter::new().with_type(RelationshipType::DependsOn)),
            vec!["ab", "bc"]
        );
        assert_eq!(
            ids(RelationshipFilter::new().with_type(RelationshipType::Other("inspired_by".into()))),
            vec!["ac"]
        );
        assert_eq!(ids(RelationshipFilter::new().to_node("c")), vec!["ac", "bc"]);
        assert_eq!(
            ids(RelationshipFilter::new().from_node("a").to_node("c")),
            vec!["ac"]
        );
    }
}
