//! Error types for the offline worker.

use std::path::PathBuf;

use thiserror::Error;

use crate::worker::lifecycle::WorkerState;

/// A network fetch that produced no usable response.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The origin could not be reached (connection refused, DNS, reset).
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    /// The origin did not answer within the request timeout.
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    /// The origin answered with a status `add_all` refuses to store.
    #[error("bad status {status} fetching {url}")]
    BadStatus { url: String, status: u16 },
}

/// Errors reading or writing the on-disk cache snapshot.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot index is malformed: {0}")]
    Index(#[from] serde_json::Error),

    #[error("Body file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid header in snapshot: {0}")]
    InvalidHeader(String),

    #[error("Invalid body file name in snapshot: {0:?}")]
    InvalidBodyFile(String),
}

/// Errors surfaced by worker event handlers.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// One of the pinned assets could not be fetched; nothing was cached.
    #[error("install failed: {0}")]
    InstallFailed(#[source] FetchError),

    /// An asset path could not be resolved against the origin.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network failed and no cached entry exists for the request.
    #[error("no response available for {0}")]
    NoResponse(String),

    /// A lifecycle transition was requested from the wrong state.
    #[error("cannot {action} while worker is {state:?}")]
    InvalidState {
        action: &'static str,
        state: WorkerState,
    },

    /// Push payload was not the expected JSON document.
    #[error("malformed push payload: {0}")]
    PushPayload(#[from] serde_json::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// A specialized `Result` type for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;
