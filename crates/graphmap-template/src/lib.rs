//! Object-graph mapping over a vertex/edge store.
//!
//! [`GraphTemplate`] persists [`Entity`] values as vertices and hands out
//! [`EdgeEntity`] handles for (outbound, label, inbound) triples.

mod edge;
mod entity;
mod error;
mod template;

pub use edge::EdgeEntity;
pub use entity::Entity;
pub use error::MappingError;
pub use graphmap_types::{Direction, EdgeId, EdgeRecord, EntityId, Property, PropertyMap};
pub use template::GraphTemplate;
