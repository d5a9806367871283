//! Vertex/edge store implementations.

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use graphmap_types::{
    Direction, EdgeId, EdgeRecord, EdgeStore, EntityId, GraphStoreError, Property, PropertyMap,
    VertexRecord, VertexStore,
};
pub use memory::InMemoryGraphStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteGraphStore;
