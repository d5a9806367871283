//! Edge handle returned by [`crate::GraphTemplate::edge`].

use crate::MappingError;
use graphmap_types::{EdgeId, EdgeRecord, EdgeStore, Property};
use std::fmt;
use std::sync::Arc;

/// A persisted, directed edge from an `O` entity to an `I` entity.
///
/// Property writes go straight to the store; the handle's bag mirrors the
/// stored bag after every successful write. Two handles are equal when their
/// edge ids are equal.
///
/// Observers (`get`, `properties`, `size`, `is_empty`) report this handle's
/// last-known state and never read the store. Writes made through another
/// handle to the same edge show up here only after [`EdgeEntity::refresh`].
pub struct EdgeEntity<I, O> {
    record: EdgeRecord,
    outbound: O,
    inbound: I,
    store: Arc<dyn EdgeStore>,
}

impl<I, O> EdgeEntity<I, O> {
    pub(crate) fn new(
        record: EdgeRecord,
        outbound: O,
        inbound: I,
        store: Arc<dyn EdgeStore>,
    ) -> Self {
        Self {
            record,
            outbound,
            inbound,
            store,
        }
    }

    pub fn id(&self) -> &EdgeId {
        &self.record.id
    }

    pub fn label(&self) -> &str {
        &self.record.label
    }

    pub fn outbound(&self) -> &O {
        &self.outbound
    }

    pub fn inbound(&self) -> &I {
        &self.inbound
    }

    /// Properties in insertion order.
    pub fn properties(&self) -> &[Property] {
        &self.record.properties
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.record.property(key)
    }

    pub fn is_empty(&self) -> bool {
        self.record.properties.is_empty()
    }

    pub fn size(&self) -> usize {
        self.record.properties.len()
    }

    /// Underlying stored record.
    pub fn record(&self) -> &EdgeRecord {
        &self.record
    }

    /// Insert or overwrite a property. An empty key or a null value is rejected
    /// before the store is touched.
    pub async fn add(
        &mut self,
        key: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<(), MappingError> {
        if key.is_empty() {
            return Err(MappingError::MissingArgument("key"));
        }
        let value = value.into();
        if value.is_null() {
            return Err(MappingError::MissingArgument("value"));
        }
        self.record = self
            .store
            .set_edge_property(&self.record.id, key, value)
            .await
            .map_err(MappingError::from_edge_op)?;
        Ok(())
    }

    /// Remove a property; absent keys are ignored. The edge itself survives an
    /// emptied bag.
    pub async fn remove(&mut self, key: &str) -> Result<(), MappingError> {
        if key.is_empty() {
            return Err(MappingError::MissingArgument("key"));
        }
        self.record = self
            .store
            .remove_edge_property(&self.record.id, key)
            .await
            .map_err(MappingError::from_edge_op)?;
        Ok(())
    }

    /// Delete the edge from the store. The id is retired: asking the template
    /// for the same triple afterwards creates a new edge. Deleting twice is a no-op.
    pub async fn delete(&self) -> Result<(), MappingError> {
        let existed = self.store.delete_edge(&self.record.id).await?;
        if !existed {
            tracing::debug!(edge_id = %self.record.id, "edge already deleted");
        }
        Ok(())
    }

    /// Reload the property bag from the store.
    pub async fn refresh(&mut self) -> Result<(), MappingError> {
        self.record = self
            .store
            .get_edge(&self.record.id)
            .await?
            .ok_or_else(|| MappingError::EdgeNotFound(self.record.id.clone()))?;
        Ok(())
    }
}

impl<I, O> PartialEq for EdgeEntity<I, O> {
    fn eq(&self, other: &Self) -> bool {
        self.record.id == other.record.id
    }
}

impl<I, O> Eq for EdgeEntity<I, O> {}

impl<I: fmt::Debug, O: fmt::Debug> fmt::Debug for EdgeEntity<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeEntity")
            .field("id", &self.record.id)
            .field("label", &self.record.label)
            .field("outbound", &self.outbound)
            .field("inbound", &self.inbound)
            .field("properties", &self.record.properties)
            .finish()
    }
}

impl<I: Clone, O: Clone> Clone for EdgeEntity<I, O> {
    fn clone(&self) -> Self {
        Self {
            record: self.record.clone(),
            outbound: self.outbound.clone(),
            inbound: self.inbound.clone(),
            store: Arc::clone(&self.store),
        }
    }
}
