//! Delegation token secret manager.
//!
//! Owns the live-token set and the master key ring, and implements the
//! generate/renew/verify/cancel/expire primitives. All mutating operations
//! take the write half of one lock; verification takes the read half and
//! therefore observes a consistent snapshot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};
use tlc_shared::TokenConfig;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::entities::{DelegationToken, TokenIdentifier};
use crate::errors::{CoreError, CoreResult, TokenError};

use super::key_ring::SecretKeyRing;

/// Callback invoked exactly once when a token passes its max lifetime and
/// is removed from the live set. Must not panic.
pub type ExpireHook = Arc<dyn Fn(&TokenIdentifier) + Send + Sync>;

/// Upper bound on any configured interval. Keeps date arithmetic against
/// `Utc::now()` far away from the `DateTime` range limits.
fn max_interval() -> Duration {
    Duration::days(100 * 365)
}

fn clamp_interval(interval: std::time::Duration) -> Duration {
    match Duration::from_std(interval) {
        Ok(duration) => duration.min(max_interval()),
        Err(_) => max_interval(),
    }
}

struct LiveTokenEntry {
    /// Current expiry, advanced by renewal and capped at the identifier's
    /// max date
    renew_date: DateTime<Utc>,
}

struct ManagerState {
    key_ring: SecretKeyRing,
    live_tokens: HashMap<TokenIdentifier, LiveTokenEntry>,
    cancelled: HashSet<TokenIdentifier>,
    sequence: i64,
}

/// Secret manager for delegation tokens.
pub struct DelegationTokenSecretManager {
    renew_interval: Duration,
    max_lifetime: Duration,
    validation: Validation,
    state: RwLock<ManagerState>,
    on_expire: ExpireHook,
}

impl DelegationTokenSecretManager {
    /// Creates a secret manager with a no-op expiry hook.
    pub fn new(config: &TokenConfig) -> Self {
        Self::with_expire_hook(config, Arc::new(|_| {}))
    }

    /// Creates a secret manager that invokes `on_expire` once per expired
    /// token removed by the background scan.
    pub fn with_expire_hook(config: &TokenConfig, on_expire: ExpireHook) -> Self {
        let renew_interval = clamp_interval(config.token_renew_interval);
        let max_lifetime = clamp_interval(config.token_max_lifetime);
        let key_interval = clamp_interval(config.secret_key_interval);

        // A key must outlive every token signed under it.
        let key_lifetime = key_interval
            .checked_add(&max_lifetime)
            .unwrap_or_else(max_interval);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            renew_interval,
            max_lifetime,
            validation,
            state: RwLock::new(ManagerState {
                key_ring: SecretKeyRing::new(key_lifetime),
                live_tokens: HashMap::new(),
                cancelled: HashSet::new(),
                sequence: 0,
            }),
            on_expire,
        }
    }

    /// Allocates, signs and registers a fresh token for `owner`.
    pub async fn generate_token(
        &self,
        owner: &str,
        renewer: &str,
    ) -> CoreResult<DelegationToken> {
        let now = Utc::now();
        let mut state = self.state.write().await;
        state.sequence += 1;

        let key = state.key_ring.current();
        let identifier = TokenIdentifier {
            owner: owner.to_string(),
            renewer: renewer.to_string(),
            real_user: String::new(),
            issue_date: now,
            max_date: now + self.max_lifetime,
            sequence_number: state.sequence,
            master_key_id: key.key_id(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(key.key_id().to_string());
        let password = encode(&header, &identifier, &key.encoding_key()).map_err(|e| {
            CoreError::Token(TokenError::GenerationFailed {
                message: e.to_string(),
            })
        })?;

        let renew_date = self.initial_renew_date(&identifier, now);
        state
            .live_tokens
            .insert(identifier.clone(), LiveTokenEntry { renew_date });

        debug!(
            owner,
            sequence = identifier.sequence_number,
            "generated delegation token"
        );
        Ok(DelegationToken::new(identifier, password))
    }

    /// Advances the token's current expiry to `min(now + renew_interval,
    /// max_date)` and returns the new expiry.
    pub async fn renew_token(
        &self,
        token: &DelegationToken,
        renewer: &str,
    ) -> CoreResult<DateTime<Utc>> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let decoded = self.decode_password(&state, &token.password, now)?;
        if decoded != token.identifier {
            return Err(TokenError::InvalidSignature.into());
        }
        if state.cancelled.contains(&token.identifier) {
            return Err(TokenError::Cancelled.into());
        }

        let max_date = token.identifier.max_date;
        let entry = state
            .live_tokens
            .get_mut(&token.identifier)
            .ok_or(TokenError::NotFound)?;

        if now > max_date {
            return Err(TokenError::MaxLifetimeExceeded.into());
        }
        if now > entry.renew_date {
            return Err(TokenError::Expired.into());
        }

        entry.renew_date = (now + self.renew_interval).min(max_date);
        let renew_date = entry.renew_date;
        debug!(
            renewer,
            sequence = token.identifier.sequence_number,
            %renew_date,
            "renewed delegation token"
        );
        Ok(renew_date)
    }

    /// Verifies a bearer credential and returns the identifier it vouches
    /// for.
    pub async fn verify_password(&self, password: &str) -> CoreResult<TokenIdentifier> {
        let now = Utc::now();
        let state = self.state.read().await;

        let identifier = self.decode_password(&state, password, now)?;
        if state.cancelled.contains(&identifier) {
            return Err(TokenError::Cancelled.into());
        }
        let entry = state
            .live_tokens
            .get(&identifier)
            .ok_or(TokenError::NotFound)?;
        if now > entry.renew_date {
            return Err(TokenError::Expired.into());
        }
        Ok(identifier)
    }

    /// Verifies a full token, additionally checking that the signed payload
    /// matches the identifier the caller presents.
    pub async fn verify_token(&self, token: &DelegationToken) -> CoreResult<TokenIdentifier> {
        let identifier = self.verify_password(&token.password).await?;
        if identifier != token.identifier {
            return Err(TokenError::InvalidSignature.into());
        }
        Ok(identifier)
    }

    /// Removes the token from the live set. Cancelling an already-cancelled
    /// token is a no-op; cancelling a token this manager never issued (or
    /// one already dropped by the expiry scan) is `NotFound`.
    pub async fn cancel_token(&self, token: &DelegationToken, canceller: &str) -> CoreResult<()> {
        let mut state = self.state.write().await;

        if state.cancelled.contains(&token.identifier) {
            return Ok(());
        }
        if state.live_tokens.remove(&token.identifier).is_none() {
            return Err(TokenError::NotFound.into());
        }
        state.cancelled.insert(token.identifier.clone());
        info!(
            canceller,
            sequence = token.identifier.sequence_number,
            "cancelled delegation token"
        );
        Ok(())
    }

    /// Drops every token whose max lifetime has passed and fires the expiry
    /// hook once per dropped token. Returns how many were dropped.
    pub async fn remove_expired_tokens(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<TokenIdentifier> = {
            let mut state = self.state.write().await;
            let expired: Vec<TokenIdentifier> = state
                .live_tokens
                .keys()
                .filter(|identifier| identifier.is_past_max_lifetime(now))
                .cloned()
                .collect();
            for identifier in &expired {
                state.live_tokens.remove(identifier);
            }
            // Cancelled identifiers past their max lifetime can never come
            // back; stop tracking them.
            state
                .cancelled
                .retain(|identifier| !identifier.is_past_max_lifetime(now));
            expired
        };

        // Hook runs outside the lock so a slow observer cannot stall the
        // request path.
        for identifier in &expired {
            info!(
                owner = %identifier.owner,
                sequence = identifier.sequence_number,
                "delegation token expired"
            );
            (self.on_expire)(identifier);
        }
        expired.len()
    }

    /// Rotates in a fresh master key and returns its id.
    pub async fn roll_master_key(&self) -> u64 {
        let mut state = self.state.write().await;
        let key_id = state.key_ring.roll(Utc::now());
        debug!(key_id, "rolled master key");
        key_id
    }

    /// Number of tokens currently in the live set.
    pub async fn live_token_count(&self) -> usize {
        self.state.read().await.live_tokens.len()
    }

    fn initial_renew_date(&self, identifier: &TokenIdentifier, now: DateTime<Utc>) -> DateTime<Utc> {
        (now + self.renew_interval).min(identifier.max_date)
    }

    /// Decodes and signature-checks a credential against the key ring.
    fn decode_password(
        &self,
        state: &ManagerState,
        password: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<TokenIdentifier> {
        let header = decode_header(password).map_err(|_| TokenError::InvalidSignature)?;

        // Prefer the key named in the header; fall back to scanning the
        // ring so tokens survive a kid we no longer recognize directly.
        if let Some(key_id) = header.kid.as_deref().and_then(|kid| kid.parse::<u64>().ok()) {
            if let Some(key) = state.key_ring.find(key_id, now) {
                let data = decode::<TokenIdentifier>(password, &key.decoding_key(), &self.validation)
                    .map_err(|_| TokenError::InvalidSignature)?;
                return Ok(data.claims);
            }
        }
        for key in state.key_ring.verification_keys(now) {
            if let Ok(data) =
                decode::<TokenIdentifier>(password, &key.decoding_key(), &self.validation)
            {
                return Ok(data.claims);
            }
        }
        Err(TokenError::InvalidSignature.into())
    }
}
