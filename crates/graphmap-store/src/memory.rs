//! In-memory vertex/edge store.

use graphmap_types::{Direction, EdgeId, EdgeRecord, EdgeStore, EntityId, GraphStoreError};
use graphmap_types::{PropertyMap, VertexRecord, VertexStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Triple = (EntityId, String, EntityId);
type EdgeIndex = HashMap<EntityId, Vec<EdgeId>>;

fn triple_of(edge: &EdgeRecord) -> Triple {
    (edge.outbound.clone(), edge.label.clone(), edge.inbound.clone())
}

/// Edge tables live behind one lock so get-or-create and delete never interleave.
#[derive(Default)]
struct EdgeTable {
    /// edge_id -> edge.
    edges: HashMap<EdgeId, EdgeRecord>,
    /// (outbound, label, inbound) -> live edge_id.
    triples: HashMap<Triple, EdgeId>,
    /// outbound vertex -> edge_ids.
    out_index: EdgeIndex,
    /// inbound vertex -> edge_ids.
    in_index: EdgeIndex,
}

impl EdgeTable {
    fn add_to_index(index: &mut EdgeIndex, vertex: &EntityId, edge_id: &EdgeId) {
        let list = index.entry(vertex.clone()).or_default();
        if !list.contains(edge_id) {
            list.push(edge_id.clone());
        }
    }

    fn remove_from_index(index: &mut EdgeIndex, vertex: &EntityId, edge_id: &EdgeId) {
        if let Some(list) = index.get_mut(vertex) {
            list.retain(|x| x != edge_id);
            if list.is_empty() {
                index.remove(vertex);
            }
        }
    }

    fn insert(&mut self, edge: EdgeRecord) {
        Self::add_to_index(&mut self.out_index, &edge.outbound, &edge.id);
        Self::add_to_index(&mut self.in_index, &edge.inbound, &edge.id);
        self.triples.insert(triple_of(&edge), edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    fn remove(&mut self, id: &EdgeId) -> Option<EdgeRecord> {
        let edge = self.edges.remove(id)?;
        Self::remove_from_index(&mut self.out_index, &edge.outbound, &edge.id);
        Self::remove_from_index(&mut self.in_index, &edge.inbound, &edge.id);
        self.triples.remove(&triple_of(&edge));
        Some(edge)
    }

    fn incident(&self, vertex: &EntityId, direction: Direction) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = Vec::new();
        if matches!(direction, Direction::Outbound | Direction::Both) {
            ids.extend(self.out_index.get(vertex).cloned().unwrap_or_default());
        }
        if matches!(direction, Direction::Inbound | Direction::Both) {
            for id in self.in_index.get(vertex).cloned().unwrap_or_default() {
                // Self-loops sit in both indexes.
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }
}

/// In-memory implementation of [`VertexStore`] and [`EdgeStore`].
/// Lock order is always vertices before edges.
pub struct InMemoryGraphStore {
    /// vertex_id -> vertex.
    vertices: Arc<RwLock<HashMap<EntityId, VertexRecord>>>,
    edges: Arc<RwLock<EdgeTable>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self {
            vertices: Arc::new(RwLock::new(HashMap::new())),
            edges: Arc::new(RwLock::new(EdgeTable::default())),
        }
    }

    /// Number of live edges.
    pub async fn edge_count(&self) -> usize {
        self.edges.read().await.edges.len()
    }

    /// Number of stored vertices.
    pub async fn vertex_count(&self) -> usize {
        self.vertices.read().await.len()
    }
}

impl Default for InMemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl VertexStore for InMemoryGraphStore {
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
        self.vertices
            .write()
            .await
            .insert(vertex.id.clone(), vertex.clone());
        Ok(vertex)
    }

    async fn get_vertex(&self, id: &EntityId) -> Result<Option<VertexRecord>, GraphStoreError> {
        Ok(self.vertices.read().await.get(id).cloned())
    }

    async fn update_vertex(
        &self,
        id: &EntityId,
        properties: PropertyMap,
    ) -> Result<VertexRecord, GraphStoreError> {
        let mut guard = self.vertices.write().await;
        let vertex = guard
            .get_mut(id)
            .ok_or_else(|| GraphStoreError::VertexNotFound(id.clone()))?;
        vertex.properties = properties;
        Ok(vertex.clone())
    }

    async fn delete_vertex(&self, id: &EntityId) -> Result<bool, GraphStoreError> {
        let mut vertices = self.vertices.write().await;
        if vertices.remove(id).is_none() {
            return Ok(false);
        }
        let mut table = self.edges.write().await;
        for edge_id in table.incident(id, Direction::Both) {
            table.remove(&edge_id);
        }
        Ok(true)
    }
}

#[async_trait::async_trait]
impl EdgeStore for InMemoryGraphStore {
    async fn get_or_create_edge(
        &self,
        outbound: &EntityId,
        label: &str,
        inbound: &EntityId,
    ) -> Result<EdgeRecord, GraphStoreError> {
        let vertices = self.vertices.read().await;
        if !vertices.contains_key(outbound) {
            return Err(GraphStoreError::VertexNotFound(outbound.clone()));
        }
        if !vertices.contains_key(inbound) {
            return Err(GraphStoreError::VertexNotFound(inbound.clone()));
        }

        let mut table = self.edges.write().await;
        let key = (outbound.clone(), label.to_string(), inbound.clone());
        if let Some(edge) = table.triples.get(&key).and_then(|id| table.edges.get(id)) {
            return Ok(edge.clone());
        }
        let edge = EdgeRecord::new(outbound, label, inbound);
        tracing::debug!(edge_id = %edge.id, label, "edge created");
        table.insert(edge.clone());
        Ok(edge)
    }

    async fn find_edge(
        &self,
        outbound: &EntityId,
        label: &str,
        inbound: &EntityId,
    ) -> Result<Option<EdgeRecord>, GraphStoreError> {
        let table = self.edges.read().await;
        let key = (outbound.clone(), label.to_string(), inbound.clone());
        Ok(table
            .triples
            .get(&key)
            .and_then(|id| table.edges.get(id))
            .cloned())
    }

    async fn get_edge(&self, id: &EdgeId) -> Result<Option<EdgeRecord>, GraphStoreError> {
        Ok(self.edges.read().await.edges.get(id).cloned())
    }

    async fn set_edge_property(
        &self,
        id: &EdgeId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<EdgeRecord, GraphStoreError> {
        let mut table = self.edges.write().await;
        let edge = table
            .edges
            .get_mut(id)
            .ok_or_else(|| GraphStoreError::EdgeNotFound(id.clone()))?;
        edge.set_property(key, value);
        Ok(edge.clone())
    }

    async fn remove_edge_property(
        &self,
        id: &EdgeId,
        key: &str,
    ) -> Result<EdgeRecord, GraphStoreError> {
        let mut table = self.edges.write().await;
        let edge = table
            .edges
            .get_mut(id)
            .ok_or_else(|| GraphStoreError::EdgeNotFound(id.clone()))?;
        edge.remove_property(key);
        Ok(edge.clone())
    }

    async fn delete_edge(&self, id: &EdgeId) -> Result<bool, GraphStoreError> {
        let removed = self.edges.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(edge_id = %id, "edge deleted");
        }
        Ok(removed)
    }

    async fn edges_of(
        &self,
        vertex: &EntityId,
        direction: Direction,
        labels: &[String],
    ) -> Result<Vec<EdgeRecord>, GraphStoreError> {
        let table = self.edges.read().await;
        let mut result: Vec<EdgeRecord> = table
            .incident(vertex, direction)
            .iter()
            .filter_map(|id| table.edges.get(id))
            .filter(|e| labels.is_empty() || labels.contains(&e.label))
            .cloned()
            .collect();
        // Keep output deterministic across hash-map ordering.
        result.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(result)
    }
}
