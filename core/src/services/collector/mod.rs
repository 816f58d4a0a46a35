//! Per-application collectors and the process-wide collector registry.

mod app_collector;
mod context;
mod manager;

#[cfg(test)]
mod tests;

pub use app_collector::{AppLevelCollector, CollectorState};
pub use context::{CollectorContextResolver, StaticContextResolver};
pub use manager::CollectorManager;
