//! Process-wide registry of per-application collectors.

use std::collections::HashMap;
use std::sync::Arc;

use tlc_shared::{ApplicationId, CollectorContext, TokenConfig};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::errors::CoreResult;
use crate::services::token::{TokenLifecycle, TokenManagerService};

use super::app_collector::AppLevelCollector;
use super::context::CollectorContextResolver;

/// Registry mapping application ids to their collectors.
///
/// Constructed at service start and torn down at service stop; callers hold
/// a handle rather than reaching for ambient global state. Owns the single
/// token manager service shared by every collector on the node.
pub struct CollectorManager {
    collectors: RwLock<HashMap<ApplicationId, Arc<AppLevelCollector>>>,
    token_service: Arc<TokenManagerService>,
    context_resolver: Arc<dyn CollectorContextResolver>,
}

impl CollectorManager {
    /// Creates a manager with a freshly started token manager service.
    pub fn new(config: TokenConfig, context_resolver: Arc<dyn CollectorContextResolver>) -> Self {
        let token_service = Arc::new(TokenManagerService::new(config));
        token_service.start();
        Self::with_token_service(token_service, context_resolver)
    }

    /// Creates a manager around an externally constructed (and started)
    /// token manager service.
    pub fn with_token_service(
        token_service: Arc<TokenManagerService>,
        context_resolver: Arc<dyn CollectorContextResolver>,
    ) -> Self {
        Self {
            collectors: RwLock::new(HashMap::new()),
            token_service,
            context_resolver,
        }
    }

    /// Registers an application, activating a collector for it.
    ///
    /// Idempotent: a second registration for an already-known id returns
    /// the existing collector untouched.
    pub async fn add_application_if_absent(
        &self,
        app_id: ApplicationId,
        user: &str,
    ) -> CoreResult<Arc<AppLevelCollector>> {
        if let Some(existing) = self.collectors.read().await.get(&app_id) {
            return Ok(Arc::clone(existing));
        }

        let context = match self.context_resolver.fetch_collector_context(&app_id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(%app_id, reason = %e,
                    "collector context lookup failed, using registration defaults");
                CollectorContext::new(user, "default_flow", "1", 1)
            }
        };

        let mut collectors = self.collectors.write().await;
        // Re-check under the write lock: another registration may have won.
        if let Some(existing) = collectors.get(&app_id) {
            return Ok(Arc::clone(existing));
        }
        let token_service: Arc<dyn TokenLifecycle> = Arc::clone(&self.token_service) as _;
        let collector = AppLevelCollector::start(app_id, context, token_service).await?;
        collectors.insert(app_id, Arc::clone(&collector));
        info!(%app_id, "application registered with collector manager");
        Ok(collector)
    }

    /// Looks up the collector for an application.
    pub async fn get(&self, app_id: &ApplicationId) -> Option<Arc<AppLevelCollector>> {
        self.collectors.read().await.get(app_id).cloned()
    }

    /// Number of registered applications.
    pub async fn len(&self) -> usize {
        self.collectors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.collectors.read().await.is_empty()
    }

    /// Removes an application: evicts its collector, deactivates it and
    /// cancels its token. Returns whether the application was registered.
    pub async fn remove_application(&self, app_id: &ApplicationId) -> CoreResult<bool> {
        let removed = self.collectors.write().await.remove(app_id);
        match removed {
            Some(collector) => {
                collector.remove().await?;
                info!(%app_id, "application removed from collector manager");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The token manager service shared by all collectors.
    pub fn token_service(&self) -> &Arc<TokenManagerService> {
        &self.token_service
    }

    /// Deactivates every collector and stops the token service.
    pub async fn stop(&self) {
        let drained: Vec<(ApplicationId, Arc<AppLevelCollector>)> =
            self.collectors.write().await.drain().collect();
        for (app_id, collector) in drained {
            if let Err(e) = collector.remove().await {
                warn!(%app_id, reason = %e, "collector shutdown reported an error");
            }
        }
        self.token_service.stop();
        info!("collector manager stopped");
    }
}
