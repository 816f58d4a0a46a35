//! Delegation token lifecycle module
//!
//! This module handles all token-related operations including:
//! - Token generation, renewal, verification and cancellation
//! - Rotating master keys for token signing
//! - Background expiry of tokens past their max lifetime

mod key_ring;
mod secret_manager;
mod service;

#[cfg(test)]
mod tests;

pub use secret_manager::{DelegationTokenSecretManager, ExpireHook};
pub use service::{TokenLifecycle, TokenManagerService};
