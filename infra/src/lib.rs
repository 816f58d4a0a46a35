//! Infrastructure layer for the timeline collector.
//!
//! Provides the filesystem-backed implementation of the core's entity
//! writer interface.

pub mod storage;

pub use storage::FsEntityWriter;
