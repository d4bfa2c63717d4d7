//! The set of named cache partitions.
//!
//! `CacheStorage` is the worker's view of the cache: it opens, enumerates and
//! deletes partitions by name, matches a request across all of them, and stores
//! responses into one. Partitions keep their creation order, which is also the
//! order a cross-partition match searches them in.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::partition::Partition;
use crate::error::FetchError;
use crate::net::fetcher::Network;
use crate::net::request::{Request, Response};

/// Per-partition usage, for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionStats {
    pub name: String,
    pub entries: usize,
    pub bytes_used: usize,
}

/// All cache partitions, behind one lock.
#[derive(Default)]
pub struct CacheStorage {
    partitions: RwLock<Vec<Partition>>,
}

/// Thread-safe handle to the cache storage.
pub type SharedStorage = Arc<CacheStorage>;

/// Create an empty shared storage.
pub fn new_shared_storage() -> SharedStorage {
    Arc::new(CacheStorage::default())
}

impl CacheStorage {
    /// Build storage from already-populated partitions (snapshot restore).
    pub fn from_partitions(partitions: Vec<Partition>) -> Self {
        Self {
            partitions: RwLock::new(partitions),
        }
    }

    /// Open `name`, creating it if it does not exist. At most one partition
    /// per name ever exists.
    pub async fn open(&self, name: &str) {
        let mut partitions = self.partitions.write().await;
        if !partitions.iter().any(|p| p.name() == name) {
            debug!(partition = name, "Created partition");
            partitions.push(Partition::new(name));
        }
    }

    pub async fn has(&self, name: &str) -> bool {
        self.partitions.read().await.iter().any(|p| p.name() == name)
    }

    /// Partition names in creation order.
    pub async fn keys(&self) -> Vec<String> {
        self.partitions
            .read()
            .await
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Delete `name`. Returns whether it existed.
    pub async fn delete(&self, name: &str) -> bool {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|p| p.name() != name);
        let removed = partitions.len() != before;
        if removed {
            info!(partition = name, "Deleted partition");
        }
        removed
    }

    /// First entry for `request` across all partitions, in creation order.
    pub async fn match_request(&self, request: &Request) -> Option<Response> {
        self.partitions
            .read()
            .await
            .iter()
            .find_map(|p| p.match_request(request).cloned())
    }

    /// Entry for `request` in partition `name` only.
    pub async fn match_in(&self, name: &str, request: &Request) -> Option<Response> {
        self.partitions
            .read()
            .await
            .iter()
            .find(|p| p.name() == name)
            .and_then(|p| p.match_request(request).cloned())
    }

    /// Store one response in `name`, opening the partition if needed.
    ///
    /// Returns whether the entry was stored (non-`GET` requests are not).
    pub async fn put(&self, name: &str, request: &Request, response: Response) -> bool {
        let mut partitions = self.partitions.write().await;
        let partition = Self::get_or_create(&mut partitions, name);
        partition.put(request, response)
    }

    /// Store a batch of responses under a single lock acquisition, so the
    /// batch becomes visible all at once.
    pub async fn put_all(&self, name: &str, entries: Vec<(Request, Response)>) -> usize {
        let mut partitions = self.partitions.write().await;
        let partition = Self::get_or_create(&mut partitions, name);
        entries
            .into_iter()
            .filter(|(req, resp)| partition.put(req, resp.clone()))
            .count()
    }

    pub async fn stats(&self) -> Vec<PartitionStats> {
        self.partitions
            .read()
            .await
            .iter()
            .map(|p| PartitionStats {
                name: p.name().to_string(),
                entries: p.len(),
                bytes_used: p.bytes_used(),
            })
            .collect()
    }

    /// Copy of every partition, for writing a snapshot.
    pub async fn export(&self) -> Vec<Partition> {
        self.partitions.read().await.clone()
    }

    fn get_or_create<'a>(partitions: &'a mut Vec<Partition>, name: &str) -> &'a mut Partition {
        let idx = match partitions.iter().position(|p| p.name() == name) {
            Some(idx) => idx,
            None => {
                partitions.push(Partition::new(name));
                partitions.len() - 1
            }
        };
        &mut partitions[idx]
    }
}

/// Fetch every request, failing as a whole if any fetch fails or returns a
/// non-2xx status. Nothing is stored; the caller commits the result.
pub async fn fetch_all(
    network: &dyn Network,
    requests: Vec<Request>,
) -> Result<Vec<(Request, Response)>, FetchError> {
    try_join_all(requests.into_iter().map(|req| async move {
        let resp = network.fetch(&req).await?;
        if !resp.status.is_success() {
            return Err(FetchError::BadStatus {
                url: req.url.to_string(),
                status: resp.status.as_u16(),
            });
        }
        Ok((req, resp))
    }))
    .await
}
