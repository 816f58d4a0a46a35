//! Per-node token manager service.
//!
//! Thin facade over the secret manager that owns the background key roller
//! and expiry scan, and keeps counters for the lifecycle events it has
//! observed. Errors from the secret manager propagate to the caller
//! unchanged; retries, if any, belong to the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tlc_shared::TokenConfig;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

use crate::domain::entities::{DelegationToken, TokenIdentifier};
use crate::errors::CoreResult;

use super::secret_manager::{DelegationTokenSecretManager, ExpireHook};

/// Token operations a collector drives over its application's token.
///
/// Collectors depend on this contract rather than on the concrete service,
/// so renewal and regeneration behavior can be exercised against a failing
/// token source.
#[async_trait]
pub trait TokenLifecycle: Send + Sync {
    async fn generate_token(&self, owner: &str, renewer: &str) -> CoreResult<DelegationToken>;

    async fn renew_token(
        &self,
        token: &DelegationToken,
        renewer: &str,
    ) -> CoreResult<DateTime<Utc>>;

    async fn cancel_token(&self, token: &DelegationToken, canceller: &str) -> CoreResult<()>;

    /// Period of the collectors' renewal tick.
    fn renew_interval(&self) -> Duration;
}

/// Token manager service scoped to one collector process.
pub struct TokenManagerService {
    secret_manager: Arc<DelegationTokenSecretManager>,
    config: TokenConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    generated: AtomicU64,
    renewed: AtomicU64,
    cancelled: AtomicU64,
    expired: Arc<AtomicU64>,
}

impl TokenManagerService {
    /// Creates a service whose expiry events only bump the internal counter.
    pub fn new(config: TokenConfig) -> Self {
        Self::with_expire_hook(config, Arc::new(|_| {}))
    }

    /// Creates a service that additionally invokes `hook` once per expired
    /// token, after the internal counter is bumped.
    pub fn with_expire_hook(config: TokenConfig, hook: ExpireHook) -> Self {
        let expired = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&expired);
        let on_expire: ExpireHook = Arc::new(move |identifier: &TokenIdentifier| {
            counter.fetch_add(1, Ordering::SeqCst);
            hook(identifier);
        });
        Self {
            secret_manager: Arc::new(DelegationTokenSecretManager::with_expire_hook(
                &config, on_expire,
            )),
            config,
            tasks: Mutex::new(Vec::new()),
            generated: AtomicU64::new(0),
            renewed: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            expired,
        }
    }

    /// Spawns the master key roller and the token removal scan.
    ///
    /// Both tasks wait one full interval before their first run, so a
    /// freshly started service performs no rotation or removal at time
    /// zero.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock().expect("token service task list poisoned");
        if !tasks.is_empty() {
            return;
        }

        let manager = Arc::clone(&self.secret_manager);
        let key_interval = self.config.secret_key_interval;
        tasks.push(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + key_interval, key_interval);
            loop {
                ticker.tick().await;
                manager.roll_master_key().await;
            }
        }));

        let manager = Arc::clone(&self.secret_manager);
        let scan_interval = self.config.token_removal_scan_interval;
        tasks.push(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + scan_interval, scan_interval);
            loop {
                ticker.tick().await;
                let removed = manager.remove_expired_tokens().await;
                if removed > 0 {
                    debug!(removed, "token removal scan dropped expired tokens");
                }
            }
        }));

        info!(
            key_interval_ms = key_interval.as_millis() as u64,
            scan_interval_ms = scan_interval.as_millis() as u64,
            "token manager service started"
        );
    }

    /// Aborts the background tasks. Safe to call more than once.
    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().expect("token service task list poisoned");
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    pub async fn generate_token(&self, owner: &str, renewer: &str) -> CoreResult<DelegationToken> {
        let token = self.secret_manager.generate_token(owner, renewer).await?;
        self.generated.fetch_add(1, Ordering::SeqCst);
        Ok(token)
    }

    pub async fn renew_token(
        &self,
        token: &DelegationToken,
        renewer: &str,
    ) -> CoreResult<DateTime<Utc>> {
        let renew_date = self.secret_manager.renew_token(token, renewer).await?;
        self.renewed.fetch_add(1, Ordering::SeqCst);
        Ok(renew_date)
    }

    pub async fn cancel_token(&self, token: &DelegationToken, canceller: &str) -> CoreResult<()> {
        self.secret_manager.cancel_token(token, canceller).await?;
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub async fn verify_token(&self, token: &DelegationToken) -> CoreResult<TokenIdentifier> {
        self.secret_manager.verify_token(token).await
    }

    /// Verifies a bearer credential as presented on the wire.
    pub async fn verify_password(&self, password: &str) -> CoreResult<TokenIdentifier> {
        self.secret_manager.verify_password(password).await
    }

    /// The configured renewal interval, which doubles as the collectors'
    /// renewal tick period.
    pub fn renew_interval(&self) -> Duration {
        self.config.token_renew_interval
    }

    /// Tokens generated since the service was created.
    pub fn tokens_generated(&self) -> u64 {
        self.generated.load(Ordering::SeqCst)
    }

    /// Successful renewals since the service was created.
    pub fn tokens_renewed(&self) -> u64 {
        self.renewed.load(Ordering::SeqCst)
    }

    /// Tokens cancelled since the service was created.
    pub fn tokens_cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Tokens removed by the expiry scan since the service was created.
    pub fn tokens_expired(&self) -> u64 {
        self.expired.load(Ordering::SeqCst)
    }

    /// Direct access to the secret manager, for collaborators that only
    /// need verification.
    pub fn secret_manager(&self) -> &Arc<DelegationTokenSecretManager> {
        &self.secret_manager
    }
}

#[async_trait]
impl TokenLifecycle for TokenManagerService {
    async fn generate_token(&self, owner: &str, renewer: &str) -> CoreResult<DelegationToken> {
        TokenManagerService::generate_token(self, owner, renewer).await
    }

    async fn renew_token(
        &self,
        token: &DelegationToken,
        renewer: &str,
    ) -> CoreResult<DateTime<Utc>> {
        TokenManagerService::renew_token(self, token, renewer).await
    }

    async fn cancel_token(&self, token: &DelegationToken, canceller: &str) -> CoreResult<()> {
        TokenManagerService::cancel_token(self, token, canceller).await
    }

    fn renew_interval(&self) -> Duration {
        TokenManagerService::renew_interval(self)
    }
}

impl Drop for TokenManagerService {
    fn drop(&mut self) {
        self.stop();
    }
}
