//! Schemaless entity used by the HTTP surface.

use graphmap_template::{Entity, EntityId, MappingError, PropertyMap};
use graphmap_types::VertexRecord;
use serde::{Deserialize, Serialize};

/// A vertex of any label with free-form properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Document {
    /// Reference to a stored vertex; properties are filled in on load.
    pub fn reference(label: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            label: label.into(),
            id: Some(id.into()),
            properties: PropertyMap::new(),
        }
    }
}

impl Entity for Document {
    const LABEL: &'static str = "Document";

    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn accepts_label(_label: &str) -> bool {
        true
    }

    fn to_properties(&self) -> Result<PropertyMap, MappingError> {
        Ok(self.properties.clone())
    }

    fn from_vertex(vertex: VertexRecord) -> Result<Self, MappingError> {
        Ok(Self {
            label: vertex.label,
            id: Some(vertex.id),
            properties: vertex.properties,
        })
    }
}
