//! Filesystem entity writer.
//!
//! Writes each entity as a single JSON document appended to a file named
//! after the entity id, under a directory hierarchy keyed by cluster,
//! user, flow, run, application and entity type.

use std::path::PathBuf;

use async_trait::async_trait;
use tlc_core::domain::entities::TimelineEntity;
use tlc_core::errors::{CoreError, CoreResult};
use tlc_core::repositories::EntityWriter;
use tlc_shared::{ApplicationId, CollectorContext, StorageConfig};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// File extension for stored entity documents
pub const ENTITY_FILE_EXTENSION: &str = "thist";

/// Entity writer backed by the local filesystem.
pub struct FsEntityWriter {
    config: StorageConfig,
}

impl FsEntityWriter {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Directory all entities of one type for one application land in.
    pub fn entity_type_dir(
        &self,
        app_id: &ApplicationId,
        context: &CollectorContext,
        entity_type: &str,
    ) -> PathBuf {
        self.config
            .root_dir
            .join("entities")
            .join(&self.config.cluster_id)
            .join(&context.user)
            .join(&context.flow_name)
            .join(&context.flow_version)
            .join(context.flow_run_id.to_string())
            .join(app_id.to_string())
            .join(entity_type)
    }

    async fn append_entity(
        &self,
        app_id: &ApplicationId,
        context: &CollectorContext,
        entity: &TimelineEntity,
    ) -> CoreResult<()> {
        let dir = self.entity_type_dir(app_id, context, &entity.entity_type);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| storage_error("create entity dir", e))?;

        let path = dir.join(format!("{}.{}", entity.id, ENTITY_FILE_EXTENSION));
        let mut line = serde_json::to_vec(entity).map_err(|e| CoreError::Storage {
            message: format!("failed to encode entity {}: {}", entity.id, e),
        })?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| storage_error("open entity file", e))?;
        file.write_all(&line)
            .await
            .map_err(|e| storage_error("append entity", e))?;

        debug!(entity_id = %entity.id, path = %path.display(), "stored entity");
        Ok(())
    }
}

fn storage_error(action: &str, e: std::io::Error) -> CoreError {
    CoreError::Storage {
        message: format!("{action}: {e}"),
    }
}

#[async_trait]
impl EntityWriter for FsEntityWriter {
    async fn write_entities(
        &self,
        app_id: &ApplicationId,
        context: &CollectorContext,
        entities: &[TimelineEntity],
    ) -> CoreResult<usize> {
        for entity in entities {
            self.append_entity(app_id, context, entity).await?;
        }
        Ok(entities.len())
    }
}
