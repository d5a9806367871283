//! SQLite-backed vertex/edge store.

use async_trait::async_trait;
use graphmap_types::{
    Direction, EdgeId, EdgeRecord, EdgeStore, EntityId, GraphStoreError, Property, PropertyMap,
    VertexRecord, VertexStore,
};
use rusqlite::OptionalExtension;
use std::path::Path;

const EDGE_COLUMNS: &str = "id, label, outbound, inbound, properties";

/// SQLite-backed store. A UNIQUE index on (outbound, label, inbound) keeps one
/// live edge per triple.
pub struct SqliteGraphStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteGraphStore {
    /// Open (or create) a store at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, GraphStoreError> {
        let conn = rusqlite::Connection::open(path).map_err(other)?;
        Self::init(conn)
    }

    /// Store backed by a private in-memory database.
    pub fn in_memory() -> Result<Self, GraphStoreError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(other)?;
        Self::init(conn)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self, GraphStoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS vertices (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                properties TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS edges (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                outbound TEXT NOT NULL,
                inbound TEXT NOT NULL,
                properties TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (outbound) REFERENCES vertices(id) ON DELETE CASCADE,
                FOREIGN KEY (inbound) REFERENCES vertices(id) ON DELETE CASCADE
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_edges_triple ON edges(outbound, label, inbound);
            CREATE INDEX IF NOT EXISTS idx_edges_inbound ON edges(inbound);
            "#,
        )
        .map_err(other)?;

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, GraphStoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, GraphStoreError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| GraphStoreError::Other(format!("failed to acquire lock: {}", e)))?;
        f(&conn)
    }
}

fn other(e: impl std::fmt::Display) -> GraphStoreError {
    GraphStoreError::Other(e.to_string())
}

fn json_column_error(column: usize, e: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_edge_row(row: &rusqlite::Row) -> Result<EdgeRecord, rusqlite::Error> {
    let properties_json: String = row.get(4)?;
    let properties: Vec<Property> =
        serde_json::from_str(&properties_json).map_err(|e| json_column_error(4, e))?;
    Ok(EdgeRecord {
        id: EdgeId::new(row.get::<_, String>(0)?),
        label: row.get(1)?,
        outbound: EntityId::new(row.get::<_, String>(2)?),
        inbound: EntityId::new(row.get::<_, String>(3)?),
        properties,
    })
}

fn parse_vertex_row(row: &rusqlite::Row) -> Result<VertexRecord, rusqlite::Error> {
    let properties_json: String = row.get(2)?;
    let properties: PropertyMap =
        serde_json::from_str(&properties_json).map_err(|e| json_column_error(2, e))?;
    Ok(VertexRecord {
        id: EntityId::new(row.get::<_, String>(0)?),
        label: row.get(1)?,
        properties,
    })
}

fn select_edge(
    conn: &rusqlite::Connection,
    id: &str,
) -> Result<Option<EdgeRecord>, GraphStoreError> {
    conn.query_row(
        &format!("SELECT {} FROM edges WHERE id = ?1", EDGE_COLUMNS),
        [id],
        parse_edge_row,
    )
    .optional()
    .map_err(other)
}

fn select_triple(
    conn: &rusqlite::Connection,
    outbound: &str,
    label: &str,
    inbound: &str,
) -> Result<Option<EdgeRecord>, GraphStoreError> {
    conn.query_row(
        &format!(
            "SELECT {} FROM edges WHERE outbound = ?1 AND label = ?2 AND inbound = ?3",
            EDGE_COLUMNS
        ),
        rusqlite::params![outbound, label, inbound],
        parse_edge_row,
    )
    .optional()
    .map_err(other)
}

fn vertex_exists(conn: &rusqlite::Connection, id: &str) -> Result<bool, GraphStoreError> {
    conn.query_row("SELECT 1 FROM vertices WHERE id = ?1", [id], |_| Ok(()))
        .optional()
        .map(|r| r.is_some())
        .map_err(other)
}

/// Read-modify-write of one edge's property bag inside a transaction.
fn update_properties<F>(
    conn: &rusqlite::Connection,
    id: &EdgeId,
    mutate: F,
) -> Result<EdgeRecord, GraphStoreError>
where
    F: FnOnce(&mut EdgeRecord),
{
    let tx = conn.unchecked_transaction().map_err(other)?;
    let mut edge =
        select_edge(&tx, id.as_str())?.ok_or_else(|| GraphStoreError::EdgeNotFound(id.clone()))?;
    mutate(&mut edge);
    let properties_json = serde_json::to_string(&edge.properties).map_err(other)?;
    tx.execute(
        "UPDATE edges SET properties = ?1 WHERE id = ?2",
        rusqlite::params![properties_json, id.as_str()],
    )
    .map_err(other)?;
    tx.commit().map_err(other)?;
    Ok(edge)
}

#[async_trait]
impl VertexStore for SqliteGraphStore {
    async fn add_vertex(
        &self,
        label: &str,
        properties: PropertyMap,
    ) -> Result<VertexRecord, GraphStoreError> {
        let vertex = VertexRecord {
            id: EntityId::generate(),
            label: label.to_string(),
            properties,
        };
        let properties_json = serde_json::to_string(&vertex.properties).map_err(other)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO vertices (id, label, properties, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![vertex.id.as_str(), vertex.label, properties_json, now, now],
            )
            .map_err(other)
        })?;
        Ok(vertex)
    }

    async fn get_vertex(&self, id: &EntityId) -> Result<Option<VertexRecord>, GraphStoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, label, properties FROM vertices WHERE id = ?1",
                [id.as_str()],
                parse_vertex_row,
            )
            .optional()
            .map_err(other)
        })
    }

    async fn update_vertex(
        &self,
        id: &EntityId,
        properties: PropertyMap,
    ) -> Result<VertexRecord, GraphStoreError> {
        let properties_json = serde_json::to_string(&properties).map_err(other)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE vertices SET properties = ?1, updated_at = ?2 WHERE id = ?3",
                    rusqlite::params![properties_json, now, id.as_str()],
                )
                .map_err(other)?;
            if changed == 0 {
                return Err(GraphStoreError::VertexNotFound(id.clone()));
            }
            conn.query_row(
                "SELECT id, label, properties FROM vertices WHERE id = ?1",
                [id.as_str()],
                parse_vertex_row,
            )
            .map_err(other)
        })
    }

    async fn delete_vertex(&self, id: &EntityId) -> Result<bool, GraphStoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(other)?;
            tx.execute(
                "DELETE FROM edges WHERE outbound = ?1 OR inbound = ?1",
                [id.as_str()],
            )
            .map_err(other)?;
            let count = tx
                .execute("DELETE FROM vertices WHERE id = ?1", [id.as_str()])
                .map_err(other)?;
            tx.commit().map_err(other)?;
            Ok(count > 0)
        })
    }
}

#[async_trait]
impl EdgeStore for SqliteGraphStore {
    async fn get_or_create_edge(
        &self,
        outbound: &EntityId,
        label: &str,
        inbound: &EntityId,
    ) -> Result<EdgeRecord, GraphStoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(other)?;
            if let Some(edge) = select_triple(&tx, outbound.as_str(), label, inbound.as_str())? {
                return Ok(edge);
            }
            for vertex in [outbound, inbound] {
                if !vertex_exists(&tx, vertex.as_str())? {
                    return Err(GraphStoreError::VertexNotFound(vertex.clone()));
                }
            }
            let edge = EdgeRecord::new(outbound, label, inbound);
            tx.execute(
                "INSERT INTO edges (id, label, outbound, inbound, properties, created_at) \
                 VALUES (?1, ?2, ?3, ?4, '[]', ?5)",
                rusqlite::params![
                    edge.id.as_str(),
                    edge.label,
                    edge.outbound.as_str(),
                    edge.inbound.as_str(),
                    now,
                ],
            )
            .map_err(other)?;
            tx.commit().map_err(other)?;
            tracing::debug!(edge_id = %edge.id, label, "edge created");
            Ok(edge)
        })
    }

    async fn find_edge(
        &self,
        outbound: &EntityId,
        label: &str,
        inbound: &EntityId,
    ) -> Result<Option<EdgeRecord>, GraphStoreError> {
        self.with_conn(|conn| select_triple(conn, outbound.as_str(), label, inbound.as_str()))
    }

    async fn get_edge(&self, id: &EdgeId) -> Result<Option<EdgeRecord>, GraphStoreError> {
        self.with_conn(|conn| select_edge(conn, id.as_str()))
    }

    async fn set_edge_property(
        &self,
        id: &EdgeId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<EdgeRecord, GraphStoreError> {
        self.with_conn(|conn| update_properties(conn, id, |edge| edge.set_property(key, value)))
    }

    async fn remove_edge_property(
        &self,
        id: &EdgeId,
        key: &str,
    ) -> Result<EdgeRecord, GraphStoreError> {
        self.with_conn(|conn| {
            update_properties(conn, id, |edge| {
                edge.remove_property(key);
            })
        })
    }

    async fn delete_edge(&self, id: &EdgeId) -> Result<bool, GraphStoreError> {
        let count = self.with_conn(|conn| {
            conn.execute("DELETE FROM edges WHERE id = ?1", [id.as_str()])
                .map_err(other)
        })?;
        if count > 0 {
            tracing::debug!(edge_id = %id, "edge deleted");
        }
        Ok(count > 0)
    }

    async fn edges_of(
        &self,
        vertex: &EntityId,
        direction: Direction,
        labels: &[String],
    ) -> Result<Vec<EdgeRecord>, GraphStoreError> {
        let filter = match direction {
            Direction::Outbound => "outbound = ?1",
            Direction::Inbound => "inbound = ?1",
            Direction::Both => "(outbound = ?1 OR inbound = ?1)",
        };
        let sql = format!(
            "SELECT {} FROM edges WHERE {} ORDER BY id",
            EDGE_COLUMNS, filter
        );
        let edges = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(other)?;
            let rows = stmt
                .query_map([vertex.as_str()], parse_edge_row)
                .map_err(other)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(other)
        })?;
        Ok(edges
            .into_iter()
            .filter(|e| labels.is_empty() || labels.contains(&e.label))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    async fn vertex(store: &SqliteGraphStore, label: &str) -> VertexRecord {
        store.add_vertex(label, PropertyMap::new()).await.unwrap()
    }

    async fn reads(store: &SqliteGraphStore, a: &VertexRecord, b: &VertexRecord) -> EdgeRecord {
        store
            .get_or_create_edge(&a.id, "reads", &b.id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn edges_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");

        let (edge_id, a, b) = {
            let store = SqliteGraphStore::new(&path).unwrap();
            let a = vertex(&store, "Person").await;
            let b = vertex(&store, "Book").await;
            let edge = reads(&store, &a, &b).await;
            store
                .set_edge_property(&edge.id, "where", json!("Brazil"))
                .await
                .unwrap();
            (edge.id, a.id, b.id)
        };

        let store = SqliteGraphStore::new(&path).unwrap();
        let edge = store.get_or_create_edge(&a, "reads", &b).await.unwrap();
        assert_eq!(edge.id, edge_id);
        assert_eq!(edge.property("where"), Some(&json!("Brazil")));
    }

    #[tokio::test]
    async fn property_order_is_preserved() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let a = vertex(&store, "Person").await;
        let b = vertex(&store, "Book").await;
        let edge = reads(&store, &a, &b).await;

        for (k, v) in [("z", json!(1)), ("a", json!(2)), ("m", json!(3))] {
            store.set_edge_property(&edge.id, k, v).await.unwrap();
        }
        let edge = store.remove_edge_property(&edge.id, "a").await.unwrap();
        let keys: Vec<&str> = edge.properties.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["z", "m"]);
    }

    #[tokio::test]
    async fn delete_then_recreate_assigns_new_id() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let a = vertex(&store, "Person").await;
        let b = vertex(&store, "Book").await;

        let edge = reads(&store, &a, &b).await;
        assert!(store.delete_edge(&edge.id).await.unwrap());
        let fresh = reads(&store, &a, &b).await;
        assert_ne!(edge.id, fresh.id);
    }

    #[tokio::test]
    async fn concurrent_get_or_create_yields_one_edge() {
        let store = Arc::new(SqliteGraphStore::in_memory().unwrap());
        let a = vertex(&store, "Person").await;
        let b = vertex(&store, "Book").await;

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            let (a, b) = (a.id.clone(), b.id.clone());
            handles.push(tokio::spawn(async move {
                store.get_or_create_edge(&a, "reads", &b).await
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);

        let edges = store
            .edges_of(&a.id, Direction::Outbound, &[])
            .await
            .unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].id, ids[0]);
    }

    #[tokio::test]
    async fn missing_vertex_and_edge_errors() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let a = vertex(&store, "Person").await;

        let err = store
            .get_or_create_edge(&a.id, "reads", &EntityId::from("10"))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphStoreError::VertexNotFound(_)));

        let err = store
            .remove_edge_property(&EdgeId::from("nope"), "where")
            .await
            .unwrap_err();
        assert!(matches!(err, GraphStoreError::EdgeNotFound(_)));
    }

    #[tokio::test]
    async fn deleting_a_vertex_cascades_edges() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let a = vertex(&store, "Person").await;
        let b = vertex(&store, "Book").await;
        let edge = reads(&store, &a, &b).await;

        assert!(store.delete_vertex(&a.id).await.unwrap());
        assert!(store.get_edge(&edge.id).await.unwrap().is_none());
        assert!(store
            .edges_of(&b.id, Direction::Both, &[])
            .await
            .unwrap()
            .is_empty());
    }
}
