//! Stored vertex and edge records.

use crate::{EdgeId, EntityId};
use serde::{Deserialize, Serialize};

/// Vertex property map; an entity's serialized fields minus its id.
pub type PropertyMap = serde_json::Map<String, serde_json::Value>;

/// One key/value pair of an edge property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: serde_json::Value,
}

impl Property {
    pub fn of(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Persisted vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub id: EntityId,
    pub label: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Persisted directed edge. `properties` keeps insertion order and unique keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub label: String,
    pub outbound: EntityId,
    pub inbound: EntityId,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl EdgeRecord {
    /// New edge with a fresh id and an empty property bag.
    pub fn new(outbound: &EntityId, label: &str, inbound: &EntityId) -> Self {
        Self {
            id: EdgeId::generate(),
            label: label.to_string(),
            outbound: outbound.clone(),
            inbound: inbound.clone(),
            properties: Vec::new(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }

    /// Insert or overwrite; an overwritten key keeps its position.
    pub fn set_property(&mut self, key: &str, value: serde_json::Value) {
        match self.properties.iter_mut().find(|p| p.key == key) {
            Some(existing) => existing.value = value,
            None => self.properties.push(Property::of(key, value)),
        }
    }

    /// Returns whether the key was present.
    pub fn remove_property(&mut self, key: &str) -> bool {
        let before = self.properties.len();
        self.properties.retain(|p| p.key != key);
        self.properties.len() != before
    }

    /// Whether this edge touches `vertex` in the given direction.
    pub fn touches(&self, vertex: &EntityId, direction: Direction) -> bool {
        match direction {
            Direction::Outbound => &self.outbound == vertex,
            Direction::Inbound => &self.inbound == vertex,
            Direction::Both => &self.outbound == vertex || &self.inbound == vertex,
        }
    }
}

/// Edge direction relative to a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Edges leaving the vertex.
    Outbound,
    /// Edges arriving at the vertex.
    Inbound,
    Both,
}
