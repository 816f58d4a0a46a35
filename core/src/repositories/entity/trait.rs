//! Entity writer trait defining the storage collaborator interface.

use async_trait::async_trait;
use tlc_shared::{ApplicationId, CollectorContext};

use crate::domain::entities::TimelineEntity;
use crate::errors::CoreResult;

/// Storage write path for published entities.
///
/// The collector core calls this only after the request gate has authorized
/// the publisher. Encoding and durability are the implementation's concern;
/// failures surface as `CoreError::Storage` and are treated as transient by
/// callers.
#[async_trait]
pub trait EntityWriter: Send + Sync {
    /// Persist a batch of entities on behalf of an application.
    ///
    /// Returns the number of entities written.
    async fn write_entities(
        &self,
        app_id: &ApplicationId,
        context: &CollectorContext,
        entities: &[TimelineEntity],
    ) -> CoreResult<usize>;

    /// Flush any buffered writes.
    async fn flush(&self) -> CoreResult<()> {
        Ok(())
    }
}
