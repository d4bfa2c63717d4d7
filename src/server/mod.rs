//! HTTP host for the worker.
//!
//! - [`proxy`]: Router, fetch interception and control routes
//! - [`metrics`]: Prometheus counters for fetch outcomes

pub mod metrics;
pub mod proxy;
