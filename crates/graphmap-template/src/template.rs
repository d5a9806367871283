//! GraphTemplate: entity persistence and get-or-create edges.

use crate::{EdgeEntity, Entity, MappingError};
use graphmap_types::{
    Direction, EdgeId, EdgeRecord, EdgeStore, EntityId, GraphStoreError, VertexStore,
};
use std::sync::Arc;

/// Entry point of the mapping layer. Both collaborators are injected; the
/// template holds no state of its own and performs no locking.
#[derive(Clone)]
pub struct GraphTemplate {
    vertices: Arc<dyn VertexStore>,
    edges: Arc<dyn EdgeStore>,
}

impl GraphTemplate {
    pub fn new(vertices: Arc<dyn VertexStore>, edges: Arc<dyn EdgeStore>) -> Self {
        Self { vertices, edges }
    }

    /// Template over a single backend that stores both vertices and edges.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: VertexStore + EdgeStore + 'static,
    {
        let vertices: Arc<dyn VertexStore> = store.clone();
        let edges: Arc<dyn EdgeStore> = store;
        Self::new(vertices, edges)
    }

    /// Persist a new entity; the returned value carries its assigned id.
    pub async fn insert<T: Entity>(&self, mut entity: T) -> Result<T, MappingError> {
        if let Some(id) = entity.id() {
            return Err(MappingError::AlreadyPersisted(id.clone()));
        }
        let properties = entity.to_properties()?;
        let vertex = self.vertices.add_vertex(entity.label(), properties).await?;
        tracing::debug!(label = %vertex.label, id = %vertex.id, "entity inserted");
        entity.set_id(vertex.id);
        Ok(entity)
    }

    /// Overwrite the stored properties of an already persisted entity.
    pub async fn update<T: Entity>(&self, entity: T) -> Result<T, MappingError> {
        let id = entity
            .id()
            .cloned()
            .ok_or(MappingError::MissingArgument("id"))?;
        self.require::<T>(&id, entity.label()).await?;
        let properties = entity.to_properties()?;
        match self.vertices.update_vertex(&id, properties).await {
            Ok(_) => Ok(entity),
            Err(GraphStoreError::VertexNotFound(id)) => Err(MappingError::EntityNotFound {
                label: entity.label().to_string(),
                id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Load an entity by id. A vertex stored under another label maps to `None`.
    pub async fn find<T: Entity>(
        &self,
        id: impl Into<EntityId>,
    ) -> Result<Option<T>, MappingError> {
        let id = id.into();
        match self.vertices.get_vertex(&id).await? {
            Some(vertex) if T::accepts_label(&vertex.label) => Ok(Some(T::from_vertex(vertex)?)),
            _ => Ok(None),
        }
    }

    /// Delete an entity and every edge touching it. Returns whether it existed.
    pub async fn delete<T: Entity>(&self, id: impl Into<EntityId>) -> Result<bool, MappingError> {
        let id = id.into();
        match self.vertices.get_vertex(&id).await? {
            Some(vertex) if T::accepts_label(&vertex.label) => {
                Ok(self.vertices.delete_vertex(&id).await?)
            }
            _ => Ok(false),
        }
    }

    /// Get or create the edge `outbound -[label]-> inbound`.
    ///
    /// Checks, in order: outbound has an id, inbound has an id, label is not
    /// empty (each [`MappingError::MissingArgument`]); then outbound and inbound
    /// resolve in the store ([`MappingError::EntityNotFound`]). A live edge for
    /// the triple is returned as is; otherwise a new one with an empty bag is
    /// created.
    pub async fn edge<O, I>(
        &self,
        outbound: &O,
        label: &str,
        inbound: &I,
    ) -> Result<EdgeEntity<I, O>, MappingError>
    where
        O: Entity,
        I: Entity,
    {
        let outbound_id = outbound
            .id()
            .ok_or(MappingError::MissingArgument("outbound"))?;
        let inbound_id = inbound
            .id()
            .ok_or(MappingError::MissingArgument("inbound"))?;
        if label.is_empty() {
            return Err(MappingError::MissingArgument("label"));
        }

        let outbound_entity: O = self.require(outbound_id, outbound.label()).await?;
        let inbound_entity: I = self.require(inbound_id, inbound.label()).await?;

        let record = match self
            .edges
            .get_or_create_edge(outbound_id, label, inbound_id)
            .await
        {
            Ok(record) => record,
            // An endpoint vanished between the lookup and the edge write.
            Err(GraphStoreError::VertexNotFound(id)) => {
                let label = if &id == outbound_id {
                    outbound.label()
                } else {
                    inbound.label()
                };
                return Err(MappingError::EntityNotFound {
                    label: label.to_string(),
                    id,
                });
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(edge_id = %record.id, label, "edge resolved");

        Ok(EdgeEntity::new(
            record,
            outbound_entity,
            inbound_entity,
            Arc::clone(&self.edges),
        ))
    }

    /// Load an edge by id together with its endpoints.
    pub async fn find_edge_by_id<I, O>(
        &self,
        id: &EdgeId,
    ) -> Result<Option<EdgeEntity<I, O>>, MappingError>
    where
        O: Entity,
        I: Entity,
    {
        let Some(record) = self.edges.get_edge(id).await? else {
            return Ok(None);
        };
        let Some(outbound) = self.find::<O>(record.outbound.clone()).await? else {
            return Ok(None);
        };
        let Some(inbound) = self.find::<I>(record.inbound.clone()).await? else {
            return Ok(None);
        };
        Ok(Some(EdgeEntity::new(record, outbound, inbound, Arc::clone(&self.edges))))
    }

    /// Delete an edge by id. Returns whether it existed.
    pub async fn delete_edge(&self, id: &EdgeId) -> Result<bool, MappingError> {
        Ok(self.edges.delete_edge(id).await?)
    }

    /// Edges touching a persisted entity, ordered by edge id. An empty `labels`
    /// slice matches every label.
    pub async fn edges<T: Entity>(
        &self,
        entity: &T,
        direction: Direction,
        labels: &[&str],
    ) -> Result<Vec<EdgeRecord>, MappingError> {
        let id = entity.id().ok_or(MappingError::MissingArgument("entity"))?;
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        Ok(self.edges.edges_of(id, direction, &labels).await?)
    }

    async fn require<T: Entity>(&self, id: &EntityId, label: &str) -> Result<T, MappingError> {
        self.find::<T>(id.clone())
            .await?
            .ok_or_else(|| MappingError::EntityNotFound {
                label: label.to_string(),
                id: id.clone(),
            })
    }
}
