//! offline-worker: offline cache for a static web site.
//!
//! Pre-populates a cache with a fixed asset list, then intercepts every
//! request and answers it from the cache or the network according to the
//! request type:
//!   pinned asset → cache-first, document → network-first,
//!   image → cache-first, everything else → network-first.
//!
//! The worker is a library driven by a host; [`server`] provides an HTTP host
//! that fronts the site origin so it stays browsable while the origin is down.

pub mod cache;
pub mod config;
pub mod error;
pub mod net;
pub mod server;
pub mod worker;

pub use error::{Result, WorkerError};
pub use worker::ServiceWorker;
