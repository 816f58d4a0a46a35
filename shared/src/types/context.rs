//! Per-application collector context

use serde::{Deserialize, Serialize};

/// Context describing the application an entity belongs to.
///
/// Supplied by the node manager when an application registers; every
/// segment ends up in the storage path of the entities that application
/// publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorContext {
    /// User the application runs as
    pub user: String,
    /// Logical flow the application belongs to
    pub flow_name: String,
    /// Version of the flow
    pub flow_version: String,
    /// Run number within the flow
    pub flow_run_id: u64,
}

impl CollectorContext {
    /// Creates a new collector context
    pub fn new(
        user: impl Into<String>,
        flow_name: impl Into<String>,
        flow_version: impl Into<String>,
        flow_run_id: u64,
    ) -> Self {
        Self {
            user: user.into(),
            flow_name: flow_name.into(),
            flow_version: flow_version.into(),
            flow_run_id,
        }
    }
}
