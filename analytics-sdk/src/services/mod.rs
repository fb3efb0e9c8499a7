//! Service-specific client implementations

pub mod google_analytics;
mod common;

pub use common::UserAgent;
