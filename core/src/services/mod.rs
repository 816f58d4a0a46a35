//! Business services layer.

pub mod collector;
pub mod token;

pub use collector::{AppLevelCollector, CollectorContextResolver, CollectorManager, CollectorState, StaticContextResolver};
pub use token::{DelegationTokenSecretManager, ExpireHook, TokenLifecycle, TokenManagerService};
