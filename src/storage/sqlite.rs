//! SQLite storage backend

use super::traits::{GraphStore, NodeFilter, OpenStore, SavedSchema, StorageError, StorageResult};
use crate::graph::{Node, NodeId, Relationship};
use crate::schema::SchemaDescriptor;
use crate::sink::{GraphSink, SinkError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed graph store
///
/// One database file holds the upserted nodes and relationships of every
/// ingest plus the saved schema descriptors. Thread-safe via an internal
/// mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                node_type TEXT NOT NULL,
                key_json TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(node_type);

            CREATE TABLE IF NOT EXISTS relationships (
                source_id TEXT NOT NULL,
                rel_type TEXT NOT NULL,
                target_id TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (source_id, rel_type, target_id),
                FOREIGN KEY (source_id) REFERENCES nodes(id) ON DELETE CASCADE,
                FOREIGN KEY (target_id) REFERENCES nodes(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships(target_id);

            CREATE TABLE IF NOT EXISTS schemas (
                name TEXT PRIMARY KEY,
                descriptor_json TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );

            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn row_to_node(
        id: String,
        node_type: String,
        key_json: String,
        properties_json: String,
    ) -> StorageResult<Node> {
        Ok(Node {
            id: parse_id(&id)?,
            node_type,
            key: serde_json::from_str(&key_json)?,
            properties: serde_json::from_str(&properties_json)?,
        })
    }

    fn row_to_relationship(
        source_id: String,
        rel_type: String,
        target_id: String,
        properties_json: String,
    ) -> StorageResult<Relationship> {
        Ok(Relationship {
            rel_type,
            source: parse_id(&source_id)?,
            target: parse_id(&target_id)?,
            properties: serde_json::from_str(&properties_json)?,
        })
    }
}

fn parse_id(id: &str) -> StorageResult<NodeId> {
    id.parse()
        .map_err(|e: uuid::Error| StorageError::InvalidId(format!("{}: {}", id, e)))
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl GraphStore for SqliteStore {
    // === Node Operations ===

    fn save_node(&self, node: &Node) -> StorageResult<()> {
        let conn = self.conn()?;
        let key_json = serde_json::to_string(&node.key)?;
        let properties_json = serde_json::to_string(&node.properties)?;

        conn.execute(
            r#"
            INSERT INTO nodes (id, node_type, key_json, properties_json, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                node_type = excluded.node_type,
                key_json = excluded.key_json,
                properties_json = json_patch(nodes.properties_json, excluded.properties_json),
                updated_at = excluded.updated_at
            "#,
            params![
                node.id.to_string(),
                node.node_type,
                key_json,
                properties_json,
                Utc::now().to_rfc3339()
            ],
        )?;

        Ok(())
    }

    fn load_node(&self, id: &NodeId) -> StorageResult<Option<Node>> {
        let conn = self.conn()?;

        let row: Option<(String, String, String, String)> = conn
            .query_row(
                "SELECT id, node_type, key_json, properties_json FROM nodes WHERE id = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        match row {
            Some((id, node_type, key, properties)) => {
                Ok(Some(Self::row_to_node(id, node_type, key, properties)?))
            }
            None => Ok(None),
        }
    }

    fn find_nodes(&self, filter: &NodeFilter) -> StorageResult<Vec<Node>> {
        let conn = self.conn()?;

        let mut sql = String::from("SELECT id, node_type, key_json, properties_json FROM nodes");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref node_type) = filter.node_type {
            sql.push_str(" WHERE node_type = ?");
            params_vec.push(Box::new(node_type.clone()));
        }

        sql.push_str(" ORDER BY node_type, id");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut nodes = Vec::new();
        for row in rows {
            let (id, node_type, key, properties) = row?;
            nodes.push(Self::row_to_node(id, node_type, key, properties)?);
        }

        Ok(nodes)
    }

    // === Relationship Operations ===

    fn save_relationship(&self, relationship: &Relationship) -> StorageResult<()> {
        let conn = self.conn()?;
        let properties_json = serde_json::to_string(&relationship.properties)?;

        conn.execute(
            r#"
            INSERT INTO relationships (source_id, rel_type, target_id, properties_json, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(source_id, rel_type, target_id) DO UPDATE SET
                properties_json = json_patch(relationships.properties_json, excluded.properties_json),
                updated_at = excluded.updated_at
            "#,
            params![
                relationship.source.to_string(),
                relationship.rel_type,
                relationship.target.to_string(),
                properties_json,
                Utc::now().to_rfc3339()
            ],
        )?;

        Ok(())
    }

    fn relationships_from(&self, id: &NodeId) -> StorageResult<Vec<Relationship>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT source_id, rel_type, target_id, properties_json
             FROM relationships WHERE source_id = ?1
             ORDER BY rel_type, target_id",
        )?;

        let rows = stmt.query_map(params![id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut relationships = Vec::new();
        for row in rows {
            let (source, rel_type, target, properties) = row?;
            relationships.push(Self::row_to_relationship(source, rel_type, target, properties)?);
        }

        Ok(relationships)
    }

    // === Saved Schemas ===

    fn save_schema(&self, name: &str, schema: &SchemaDescriptor) -> StorageResult<()> {
        let conn = self.conn()?;
        let descriptor_json = serde_json::to_string(schema)?;

        conn.execute(
            r#"
            INSERT INTO schemas (name, descriptor_json, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET
                descriptor_json = excluded.descriptor_json,
                saved_at = excluded.saved_at
            "#,
            params![name, descriptor_json, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn load_schema(&self, name: &str) -> StorageResult<Option<SchemaDescriptor>> {
        let conn = self.conn()?;

        let json: Option<String> = conn
            .query_row(
                "SELECT descriptor_json FROM schemas WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn delete_schema(&self, name: &str) -> StorageResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM schemas WHERE name = ?1", params![name])?;
        Ok(rows > 0)
    }

    fn list_schemas(&self) -> StorageResult<Vec<SavedSchema>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT name, saved_at FROM schemas ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut schemas = Vec::new();
        for row in rows {
            let (name, saved_at) = row?;
            schemas.push(SavedSchema {
                name,
                saved_at: parse_timestamp(&saved_at)?,
            });
        }

        Ok(schemas)
    }
}

#[async_trait]
impl GraphSink for SqliteStore {
    async fn upsert_node(&self, node: &Node) -> Result<(), SinkError> {
        Ok(self.save_node(node)?)
    }

    async fn upsert_relationship(
        &self,
        relationship: &Relationship,
        _source: &Node,
        _target: &Node,
    ) -> Result<(), SinkError> {
        Ok(self.save_relationship(relationship)?)
    }
}
