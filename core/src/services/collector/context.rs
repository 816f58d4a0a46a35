//! Collector context lookup capability.

use async_trait::async_trait;
use tlc_shared::{ApplicationId, CollectorContext};

use crate::errors::CoreResult;

/// Capability for resolving the context of a registering application.
///
/// In production this asks the node manager over its control channel; the
/// core depends only on this contract.
#[async_trait]
pub trait CollectorContextResolver: Send + Sync {
    /// Fetch the collector context for an application.
    async fn fetch_collector_context(
        &self,
        app_id: &ApplicationId,
    ) -> CoreResult<CollectorContext>;
}

/// Resolver that hands out one fixed context, regardless of application.
///
/// Useful for single-tenant deployments and tests.
pub struct StaticContextResolver {
    context: CollectorContext,
}

impl StaticContextResolver {
    pub fn new(context: CollectorContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl CollectorContextResolver for StaticContextResolver {
    async fn fetch_collector_context(
        &self,
        _app_id: &ApplicationId,
    ) -> CoreResult<CollectorContext> {
        Ok(self.context.clone())
    }
}
