//! Unit tests for the analytics SDK
//!
//! Timing-sensitive detector tests run on Tokio's paused clock; HTTP tests
//! run against a WireMock server.

pub mod bindings_tests;
pub mod config_tests;
