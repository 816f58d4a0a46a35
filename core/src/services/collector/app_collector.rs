//! Per-application collector owning one delegation token.

use std::sync::{Arc, Mutex, Weak};

use tlc_shared::{ApplicationId, CollectorContext};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

use crate::domain::entities::DelegationToken;
use crate::errors::{CoreError, CoreResult};
use crate::services::token::TokenLifecycle;

/// Consecutive transient renewal failures tolerated before the collector
/// reports itself unhealthy and token lookups start failing.
const MAX_RENEWAL_RETRIES: u32 = 3;

/// Lifecycle state of a per-application collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Uninitialized,
    Active,
    Removed,
}

struct Lifecycle {
    state: CollectorState,
    current_token: Option<DelegationToken>,
    consecutive_failures: u32,
}

/// One collector instance per running application.
///
/// Owns exactly one delegation token at a time. A background task renews
/// the token at the configured interval; when renewal reports an
/// invalid-token error the collector regenerates a fresh token in place,
/// without blocking publishes already in flight under the stale one.
pub struct AppLevelCollector {
    app_id: ApplicationId,
    context: CollectorContext,
    token_service: Arc<dyn TokenLifecycle>,
    lifecycle: RwLock<Lifecycle>,
    renewal_task: Mutex<Option<JoinHandle<()>>>,
}

impl AppLevelCollector {
    /// Activates a collector: synchronously obtains the application's first
    /// token, then schedules the renewal task.
    pub async fn start(
        app_id: ApplicationId,
        context: CollectorContext,
        token_service: Arc<dyn TokenLifecycle>,
    ) -> CoreResult<Arc<Self>> {
        let collector = Arc::new(Self {
            app_id,
            context,
            token_service,
            lifecycle: RwLock::new(Lifecycle {
                state: CollectorState::Uninitialized,
                current_token: None,
                consecutive_failures: 0,
            }),
            renewal_task: Mutex::new(None),
        });

        let token = collector
            .token_service
            .generate_token(&collector.context.user, &collector.context.user)
            .await?;
        {
            let mut lifecycle = collector.lifecycle.write().await;
            lifecycle.state = CollectorState::Active;
            lifecycle.current_token = Some(token);
        }
        info!(app_id = %collector.app_id, user = %collector.context.user,
            "collector activated with fresh delegation token");

        collector.spawn_renewal_task();
        Ok(collector)
    }

    fn spawn_renewal_task(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.token_service.renew_interval();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(collector) = weak.upgrade() else {
                    break;
                };
                collector.renewal_tick().await;
            }
        });
        *self
            .renewal_task
            .lock()
            .expect("collector renewal task slot poisoned") = Some(handle);
    }

    /// One scheduled renewal attempt.
    ///
    /// Invalid-token failures trigger immediate regeneration and are not
    /// propagated; transient failures are left for the next tick, bounded
    /// by [`MAX_RENEWAL_RETRIES`] before escalating to error level.
    async fn renewal_tick(&self) {
        let token = {
            let lifecycle = self.lifecycle.read().await;
            if lifecycle.state != CollectorState::Active {
                return;
            }
            lifecycle.current_token.clone()
        };
        let Some(token) = token else {
            return;
        };

        match self.token_service.renew_token(&token, &self.context.user).await {
            Ok(renew_date) => {
                let mut lifecycle = self.lifecycle.write().await;
                lifecycle.consecutive_failures = 0;
                debug!(app_id = %self.app_id, %renew_date, "renewed app delegation token");
            }
            Err(e) if e.is_invalid_token() => {
                info!(app_id = %self.app_id, reason = %e,
                    "app delegation token no longer renewable, regenerating");
                self.regenerate().await;
            }
            Err(e) => {
                let mut lifecycle = self.lifecycle.write().await;
                lifecycle.consecutive_failures += 1;
                if lifecycle.consecutive_failures >= MAX_RENEWAL_RETRIES {
                    error!(app_id = %self.app_id, failures = lifecycle.consecutive_failures,
                        reason = %e,
                        "token renewal failing persistently, publishes will be refused");
                } else {
                    warn!(app_id = %self.app_id, reason = %e,
                        "token renewal failed, will retry on next tick");
                }
            }
        }
    }

    /// Replaces the current token with a freshly generated one. The stale
    /// token stays usable by in-flight requests until verification rejects
    /// it; holders simply re-fetch.
    async fn regenerate(&self) {
        let fresh = match self
            .token_service
            .generate_token(&self.context.user, &self.context.user)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                error!(app_id = %self.app_id, reason = %e, "token regeneration failed");
                return;
            }
        };

        let stale = {
            let mut lifecycle = self.lifecycle.write().await;
            if lifecycle.state != CollectorState::Active {
                // Removed while we were generating; the fresh token must
                // not outlive the collector.
                Some(fresh)
            } else {
                lifecycle.current_token.replace(fresh);
                lifecycle.consecutive_failures = 0;
                None
            }
        };
        if let Some(orphan) = stale {
            if let Err(e) = self.token_service.cancel_token(&orphan, &self.context.user).await {
                warn!(app_id = %self.app_id, reason = %e,
                    "failed to cancel token generated during removal");
            }
        } else {
            info!(app_id = %self.app_id, "app delegation token regenerated");
        }
    }

    /// The application's current delegation token, possibly renewed or
    /// regenerated since issue.
    ///
    /// Fails once the collector is removed, and fails transiently while
    /// renewal has been failing past the retry bound, so the application
    /// sees the broken token source as a publish failure instead of
    /// holding a token whose server-side expiry is no longer advancing.
    pub async fn get_delegation_token_for_app(&self) -> CoreResult<DelegationToken> {
        let lifecycle = self.lifecycle.read().await;
        if lifecycle.state == CollectorState::Removed {
            return Err(CoreError::CollectorRemoved {
                app_id: self.app_id,
            });
        }
        if lifecycle.consecutive_failures >= MAX_RENEWAL_RETRIES {
            return Err(CoreError::Storage {
                message: format!(
                    "token renewal for {} has failed {} consecutive times",
                    self.app_id, lifecycle.consecutive_failures
                ),
            });
        }
        lifecycle
            .current_token
            .clone()
            .ok_or_else(|| CoreError::Internal {
                message: format!("collector for {} holds no token", self.app_id),
            })
    }

    /// Deactivates the collector: stops renewal and cancels the current
    /// token. Idempotent.
    pub async fn remove(&self) -> CoreResult<()> {
        if let Some(handle) = self
            .renewal_task
            .lock()
            .expect("collector renewal task slot poisoned")
            .take()
        {
            handle.abort();
        }

        let token = {
            let mut lifecycle = self.lifecycle.write().await;
            lifecycle.state = CollectorState::Removed;
            lifecycle.current_token.take()
        };

        if let Some(token) = token {
            match self.token_service.cancel_token(&token, &self.context.user).await {
                Ok(()) => info!(app_id = %self.app_id, "cancelled app delegation token"),
                // Already dropped by the expiry scan; nothing left to cancel.
                Err(e) if e.is_invalid_token() => {
                    debug!(app_id = %self.app_id, reason = %e, "token already gone on removal")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn app_id(&self) -> ApplicationId {
        self.app_id
    }

    pub fn context(&self) -> &CollectorContext {
        &self.context
    }

    pub async fn state(&self) -> CollectorState {
        self.lifecycle.read().await.state
    }
}

impl Drop for AppLevelCollector {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.renewal_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}
