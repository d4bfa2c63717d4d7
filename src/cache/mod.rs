//! Cache partitions and their persistence.
//!
//! - [`partition`]: A single named URL → response store
//! - [`storage`]: The set of partitions (open, keys, delete, match, put)
//! - [`compressor`]: zstd body compression for snapshots
//! - [`persist`]: Snapshot save/load to a directory

pub mod compressor;
pub mod partition;
pub mod persist;
pub mod storage;
