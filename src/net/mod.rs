//! Request/response model and network access.
//!
//! - [`request`]: Request, Response, Destination
//! - [`fetcher`]: `Network` trait and the reqwest-backed origin client
//! - [`memory`]: In-memory origin with call recording

pub mod fetcher;
pub mod memory;
pub mod request;
