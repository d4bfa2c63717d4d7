//! Async snapshot persistence for cache partitions.
//!
//! A snapshot directory holds an `index.json` describing every partition and
//! entry, plus one body file per entry under `bodies/`. Bodies are sharded
//! into two-character subdirectories to keep directory sizes small.
//!
//! ```text
//! <dir>/index.json
//! <dir>/bodies/3f/3f2a...e1.body.zst
//! ```

use std::path::{Path, PathBuf};

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::compressor::{BodyFormat, Compressor};
use crate::cache::partition::Partition;
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::net::request::Response;

const INDEX_FILE: &str = "index.json";
const BODIES_DIR: &str = "bodies";

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotIndex {
    partitions: Vec<PartitionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PartitionRecord {
    name: String,
    entries: Vec<EntryRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryRecord {
    key: String,
    status: u16,
    headers: Vec<(String, String)>,
    body_file: String,
    format: BodyFormat,
}

/// Snapshot statistics.
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub partitions: usize,
    pub entries: usize,
    pub bytes_written: u64,
}

/// Reads and writes partition snapshots under one directory.
pub struct SnapshotStore {
    dir: PathBuf,
    compressor: Compressor,
}

impl SnapshotStore {
    pub fn new(dir: PathBuf, config: &StorageConfig) -> Self {
        Self {
            dir,
            compressor: Compressor::new(config),
        }
    }

    fn body_path(base: &Path, file: &str) -> PathBuf {
        let shard = file.get(..2).unwrap_or(file);
        base.join(BODIES_DIR).join(shard).join(file)
    }

    /// Write every partition, replacing any previous snapshot.
    ///
    /// The new snapshot is assembled in a sibling staging directory and moved
    /// into place at the end, so a crash mid-write leaves the old one intact.
    pub async fn save(&self, partitions: &[Partition]) -> Result<SnapshotStats, StorageError> {
        let staging = self.dir.with_extension("staging");
        if staging.exists() {
            fs::remove_dir_all(&staging).await?;
        }
        fs::create_dir_all(staging.join(BODIES_DIR)).await?;

        let mut stats = SnapshotStats::default();
        let mut index = SnapshotIndex {
            partitions: Vec::with_capacity(partitions.len()),
        };

        for partition in partitions {
            let mut record = PartitionRecord {
                name: partition.name().to_string(),
                entries: Vec::with_capacity(partition.len()),
            };

            for (key, response) in partition.entries() {
                let (format, data) = self.compressor.compress(&response.body)?;
                let body_file = format!("{}.{}", Uuid::new_v4().simple(), format.extension());
                let path = Self::body_path(&staging, &body_file);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).await?;
                }
                fs::write(&path, &data).await?;
                stats.bytes_written += data.len() as u64;

                record.entries.push(EntryRecord {
                    key: key.clone(),
                    status: response.status.as_u16(),
                    headers: headers_to_pairs(&response.headers),
                    body_file,
                    format,
                });
            }

            stats.entries += record.entries.len();
            index.partitions.push(record);
        }
        stats.partitions = index.partitions.len();

        let json = serde_json::to_vec_pretty(&index)?;
        fs::write(staging.join(INDEX_FILE), json).await?;

        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).await?;
        }
        fs::rename(&staging, &self.dir).await?;

        info!(
            dir = %self.dir.display(),
            partitions = stats.partitions,
            entries = stats.entries,
            bytes = stats.bytes_written,
            "Wrote cache snapshot"
        );
        Ok(stats)
    }

    /// Load a snapshot. A missing directory yields no partitions.
    pub async fn load(&self) -> Result<Vec<Partition>, StorageError> {
        let index_path = self.dir.join(INDEX_FILE);
        if !index_path.exists() {
            debug!(dir = %self.dir.display(), "No cache snapshot found");
            return Ok(Vec::new());
        }

        let raw = fs::read(&index_path).await?;
        let index: SnapshotIndex = serde_json::from_slice(&raw)?;

        let mut partitions = Vec::with_capacity(index.partitions.len());
        for record in index.partitions {
            let mut partition = Partition::new(record.name);
            for entry in record.entries {
                if !is_plain_file_name(&entry.body_file) {
                    return Err(StorageError::InvalidBodyFile(entry.body_file));
                }
                let path = Self::body_path(&self.dir, &entry.body_file);
                if !path.exists() {
                    return Err(StorageError::FileNotFound(path));
                }
                let data = fs::read(&path).await?;
                let body = self.compressor.decompress(&data, entry.format)?;

                let status = StatusCode::from_u16(entry.status)
                    .map_err(|e| StorageError::InvalidHeader(e.to_string()))?;
                let response = Response {
                    status,
                    headers: pairs_to_headers(entry.headers)?,
                    body,
                };
                partition.insert_raw(entry.key, response);
            }
            partitions.push(partition);
        }

        info!(
            dir = %self.dir.display(),
            partitions = partitions.len(),
            "Loaded cache snapshot"
        );
        Ok(partitions)
    }
}

/// Body files are bare names generated by `save`; anything that could walk
/// out of the bodies directory is rejected.
fn is_plain_file_name(file: &str) -> bool {
    !file.is_empty()
        && !file.starts_with('.')
        && !file.contains(['/', '\\'])
}

fn headers_to_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| match value.to_str() {
            Ok(v) => Some((name.as_str().to_string(), v.to_string())),
            Err(_) => {
                warn!(header = %name, "Skipping non-text header in snapshot");
                None
            }
        })
        .collect()
}

fn pairs_to_headers(pairs: Vec<(String, String)>) -> Result<HeaderMap, StorageError> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| StorageError::InvalidHeader(e.to_string()))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|e| StorageError::InvalidHeader(e.to_string()))?;
        headers.append(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::request::Request;
    use axum::http::header::CONTENT_TYPE;
    use tempfile::TempDir;
    use url::Url;

    fn sample_partition() -> Partition {
        let mut p = Partition::new("site-static-v1");
        let mut resp = Response::ok(vec![7u8; 8192]);
        resp.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        p.put(
            &Request::get(Url::parse("http://site.test/a.png").unwrap()),
            resp,
        );
        p.put(
            &Request::get(Url::parse("http://site.test/").unwrap()),
            Response::ok("<html></html>"),
        );
        p
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("snap"), &StorageConfig::default());

        let stats = store.save(&[sample_partition(), Partition::new("empty")]).await.unwrap();
        assert_eq!(stats.partitions, 2);
        assert_eq!(stats.entries, 2);

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name(), "site-static-v1");
        assert_eq!(loaded[1].name(), "empty");

        let png = loaded[0]
            .match_request(&Request::get(Url::parse("http://site.test/a.png").unwrap()))
            .unwrap();
        assert_eq!(png.body.len(), 8192);
        assert_eq!(png.headers.get(CONTENT_TYPE).unwrap(), "image/png");
    }

    #[tokio::test]
    async fn test_save_replaces_previous_snapshot() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("snap"), &StorageConfig::default());

        store.save(&[sample_partition()]).await.unwrap();
        store.save(&[Partition::new("only")]).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name(), "only");
    }

    async fn write_index(dir: &Path, body_file: &str) {
        fs::create_dir_all(dir).await.unwrap();
        let index = SnapshotIndex {
            partitions: vec![PartitionRecord {
                name: "site-static-v1".to_string(),
                entries: vec![EntryRecord {
                    key: "http://site.test/".to_string(),
                    status: 200,
                    headers: Vec::new(),
                    body_file: body_file.to_string(),
                    format: BodyFormat::Raw,
                }],
            }],
        };
        fs::write(dir.join(INDEX_FILE), serde_json::to_vec(&index).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_rejects_escaping_body_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("snap");
        fs::write(tmp.path().join("secret"), "x").await.unwrap();

        for name in ["../../secret", "..", "ab/../../secret"] {
            write_index(&dir, name).await;
            let store = SnapshotStore::new(dir.clone(), &StorageConfig::default());
            let err = store.load().await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidBodyFile(_)), "{name}: {err}");
        }
    }

    #[tokio::test]
    async fn test_load_multibyte_body_file_name() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("snap");
        write_index(&dir, "aé.body").await;

        let store = SnapshotStore::new(dir, &StorageConfig::default());
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StorageError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_dir_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("nope"), &StorageConfig::default());
        assert!(store.load().await.unwrap().is_empty());
    }
}
