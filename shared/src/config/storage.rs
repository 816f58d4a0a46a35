//! Entity storage layout configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the filesystem entity writer.
///
/// The writer lays entities out under
/// `<root_dir>/entities/<cluster_id>/<user>/<flow>/<version>/<run>/<app>/<type>/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for entity storage
    pub root_dir: PathBuf,

    /// Cluster identifier segment in the storage path
    pub cluster_id: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("/tmp/timeline-collector"),
            cluster_id: String::from("cluster"),
        }
    }
}

impl StorageConfig {
    /// Create a storage configuration rooted at the given directory
    pub fn new(root_dir: impl Into<PathBuf>, cluster_id: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            cluster_id: cluster_id.into(),
        }
    }
}
