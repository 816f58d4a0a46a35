//! Unit tests for the token lifecycle module.

mod service_tests;
