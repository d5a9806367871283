use graphmap_types::{EdgeId, EntityId, GraphStoreError};

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// A required argument was absent: an empty label or key, a null value,
    /// or an endpoint entity that was never persisted.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("entity not found: {label} with id {id}")]
    EntityNotFound { label: String, id: EntityId },
    #[error("edge not found: {0}")]
    EdgeNotFound(EdgeId),
    #[error("entity already persisted with id {0}")]
    AlreadyPersisted(EntityId),
    #[error("mapping error: {0}")]
    Mapping(String),
    #[error("graph: {0}")]
    Graph(#[from] GraphStoreError),
}

impl MappingError {
    /// Lift store errors about a known edge into [`MappingError::EdgeNotFound`].
    pub(crate) fn from_edge_op(err: GraphStoreError) -> Self {
        match err {
            GraphStoreError::EdgeNotFound(id) => MappingError::EdgeNotFound(id),
            other => MappingError::Graph(other),
        }
    }
}

impl From<serde_json::Error> for MappingError {
    fn from(e: serde_json::Error) -> Self {
        MappingError::Mapping(e.to_string())
    }
}
