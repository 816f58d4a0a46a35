//! Unit tests for collectors and the collector registry.
