//! Domain entities for the timeline collector.

pub mod entity;
pub mod token;

pub use entity::TimelineEntity;
pub use token::{DelegationToken, TokenIdentifier, TOKEN_KIND};
