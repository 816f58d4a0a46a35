//! In-memory entity writer, used by tests and as a null storage backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tlc_shared::{ApplicationId, CollectorContext};
use tokio::sync::RwLock;

use crate::domain::entities::TimelineEntity;
use crate::errors::CoreResult;

use super::trait_::EntityWriter;

/// Entity writer that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryEntityWriter {
    entities: Arc<RwLock<HashMap<ApplicationId, Vec<TimelineEntity>>>>,
}

impl MemoryEntityWriter {
    /// Create a new empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities written so far for an application
    pub async fn written_for(&self, app_id: &ApplicationId) -> Vec<TimelineEntity> {
        let entities = self.entities.read().await;
        entities.get(app_id).cloned().unwrap_or_default()
    }

    /// Total number of entities written
    pub async fn total_written(&self) -> usize {
        let entities = self.entities.read().await;
        entities.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl EntityWriter for MemoryEntityWriter {
    async fn write_entities(
        &self,
        app_id: &ApplicationId,
        _context: &CollectorContext,
        entities: &[TimelineEntity],
    ) -> CoreResult<usize> {
        let mut stored = self.entities.write().await;
        stored
            .entry(*app_id)
            .or_default()
            .extend_from_slice(entities);
        Ok(entities.len())
    }
}
