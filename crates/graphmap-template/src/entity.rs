//! Mapping between application types and vertices.

use crate::MappingError;
use graphmap_types::{EntityId, PropertyMap, VertexRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An application type persisted as a vertex.
///
/// The default conversions go through serde: the entity serializes to a JSON
/// object whose [`Entity::ID_FIELD`] is stripped before storage and restored
/// from the vertex id on load. Dynamic types override the label methods and
/// the conversions.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Vertex label for this type.
    const LABEL: &'static str;
    /// Name of the serialized identity field.
    const ID_FIELD: &'static str = "id";

    /// Identity, present only once the entity has been inserted.
    fn id(&self) -> Option<&EntityId>;

    fn set_id(&mut self, id: EntityId);

    fn label(&self) -> &str {
        Self::LABEL
    }

    /// Whether a vertex with this label maps to `Self`.
    fn accepts_label(label: &str) -> bool {
        label == Self::LABEL
    }

    fn to_properties(&self) -> Result<PropertyMap, MappingError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(mut map) => {
                map.remove(Self::ID_FIELD);
                Ok(map)
            }
            other => Err(MappingError::Mapping(format!(
                "{} must serialize to an object, got {}",
                Self::LABEL,
                other
            ))),
        }
    }

    fn from_vertex(vertex: VertexRecord) -> Result<Self, MappingError> {
        let id = serde_json::to_value(&vertex.id)?;
        let mut map = vertex.properties;
        map.insert(Self::ID_FIELD.to_string(), id);
        Ok(serde_json::from_value(serde_json::Value::Object(map))?)
    }
}
