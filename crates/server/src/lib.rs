//! HTTP surface of the vid2audio service.
//!
//! Exposed as a library so integration tests can build the router
//! in-process.

pub mod api;
pub mod metrics;
pub mod state;
pub mod sweeper;
