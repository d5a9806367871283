//! Storage collaborator traits.

use crate::{Direction, EdgeId, EdgeRecord, EntityId, PropertyMap, VertexRecord};
use async_trait::async_trait;

/// Entity persistence collaborator: vertices keyed by store-assigned ids.
#[async_trait]
pub trait VertexStore: Send + Sync {
    /// Persist a new vertex and return it with its assigned id.
    async fn add_vertex(
        &self,
        label: &str,
        properties: PropertyMap,
    ) -> Result<VertexRecord, GraphStoreError>;

    /// Get one vertex by id.
    async fn get_vertex(&self, id: &EntityId) -> Result<Option<VertexRecord>, GraphStoreError>;

    /// Replace the properties of an existing vertex.
    async fn update_vertex(
        &self,
        id: &EntityId,
        properties: PropertyMap,
    ) -> Result<VertexRecord, GraphStoreError>;

    /// Delete a vertex and every edge incident to it. Returns whether it existed.
    async fn delete_vertex(&self, id: &EntityId) -> Result<bool, GraphStoreError>;
}

/// Graph storage collaborator: edges keyed by id and by (outbound, label, inbound).
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// Return the live edge for the triple, creating it if absent. Atomic with
    /// respect to concurrent calls for the same triple.
    async fn get_or_create_edge(
        &self,
        outbound: &EntityId,
        label: &str,
        inbound: &EntityId,
    ) -> Result<EdgeRecord, GraphStoreError>;

    /// Look up the live edge for a triple without creating it.
    async fn find_edge(
        &self,
        outbound: &EntityId,
        label: &str,
        inbound: &EntityId,
    ) -> Result<Option<EdgeRecord>, GraphStoreError>;

    async fn get_edge(&self, id: &EdgeId) -> Result<Option<EdgeRecord>, GraphStoreError>;

    /// Insert or overwrite one property; returns the updated edge.
    async fn set_edge_property(
        &self,
        id: &EdgeId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<EdgeRecord, GraphStoreError>;

    /// Remove one property if present; returns the updated edge.
    async fn remove_edge_property(
        &self,
        id: &EdgeId,
        key: &str,
    ) -> Result<EdgeRecord, GraphStoreError>;

    /// Delete an edge. Returns whether it existed.
    async fn delete_edge(&self, id: &EdgeId) -> Result<bool, GraphStoreError>;

    /// Edges incident to `vertex`, filtered by direction and (if non-empty) labels,
    /// ordered by edge id.
    async fn edges_of(
        &self,
        vertex: &EntityId,
        direction: Direction,
        labels: &[String],
    ) -> Result<Vec<EdgeRecord>, GraphStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GraphStoreError {
    #[error("vertex not found: {0}")]
    VertexNotFound(EntityId),
    #[error("edge not found: {0}")]
    EdgeNotFound(EdgeId),
    #[error("graph store error: {0}")]
    Other(String),
}
