//! Rotating master keys for token signing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::RngCore;

const SECRET_LEN: usize = 32;

/// A single HS256 master key.
pub(crate) struct MasterKey {
    key_id: u64,
    secret: Vec<u8>,
    expiry: DateTime<Utc>,
}

impl MasterKey {
    fn generate(key_id: u64, expiry: DateTime<Utc>) -> Self {
        let mut secret = vec![0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut secret);
        Self {
            key_id,
            secret,
            expiry,
        }
    }

    pub(crate) fn key_id(&self) -> u64 {
        self.key_id
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret)
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry
    }
}

/// The set of master keys currently accepted for verification.
///
/// Exactly one key is current (used for signing). Rotated-out keys remain
/// in the ring until their expiry so tokens signed under them keep
/// verifying through the grace window.
pub(crate) struct SecretKeyRing {
    keys: Vec<MasterKey>,
    current_id: u64,
    next_id: u64,
    key_lifetime: Duration,
}

impl SecretKeyRing {
    /// Creates a ring with one freshly generated key.
    ///
    /// `key_lifetime` should cover the rotation interval plus the token max
    /// lifetime, so no live token outlives the key that signed it.
    pub(crate) fn new(key_lifetime: Duration) -> Self {
        let first = MasterKey::generate(1, Utc::now() + key_lifetime);
        Self {
            keys: vec![first],
            current_id: 1,
            next_id: 2,
            key_lifetime,
        }
    }

    /// Rotates in a fresh current key and prunes keys past their expiry.
    pub(crate) fn roll(&mut self, now: DateTime<Utc>) -> u64 {
        let key_id = self.next_id;
        self.next_id += 1;
        self.keys.push(MasterKey::generate(key_id, now + self.key_lifetime));
        self.current_id = key_id;
        self.keys.retain(|key| !key.is_expired(now));
        key_id
    }

    pub(crate) fn current(&self) -> &MasterKey {
        self.keys
            .iter()
            .find(|key| key.key_id == self.current_id)
            .expect("current master key always present in ring")
    }

    /// Looks up a key by id, refusing keys past their grace window.
    pub(crate) fn find(&self, key_id: u64, now: DateTime<Utc>) -> Option<&MasterKey> {
        self.keys
            .iter()
            .find(|key| key.key_id == key_id && !key.is_expired(now))
    }

    /// All currently verifiable keys, newest first.
    pub(crate) fn verification_keys(&self, now: DateTime<Utc>) -> impl Iterator<Item = &MasterKey> {
        self.keys.iter().rev().filter(move |key| !key.is_expired(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_advances_current_key() {
        let mut ring = SecretKeyRing::new(Duration::hours(1));
        let first = ring.current().key_id();
        let rolled = ring.roll(Utc::now());
        assert_ne!(first, rolled);
        assert_eq!(ring.current().key_id(), rolled);
    }

    #[test]
    fn test_rotated_key_stays_verifiable_in_grace_window() {
        let mut ring = SecretKeyRing::new(Duration::hours(1));
        let first = ring.current().key_id();
        ring.roll(Utc::now());
        assert!(ring.find(first, Utc::now()).is_some());
    }

    #[test]
    fn test_key_pruned_after_grace_window() {
        let mut ring = SecretKeyRing::new(Duration::milliseconds(0));
        let first = ring.current().key_id();
        // With a zero lifetime the first key is already past expiry.
        ring.roll(Utc::now() + Duration::seconds(1));
        assert!(ring.find(first, Utc::now() + Duration::seconds(1)).is_none());
    }

    #[test]
    fn test_unknown_key_id() {
        let ring = SecretKeyRing::new(Duration::hours(1));
        assert!(ring.find(42, Utc::now()).is_none());
    }
}
