//! Body compression for on-disk snapshots.
//!
//! Response bodies are zstd-compressed when written to the snapshot directory
//! and decompressed on load. In-memory partitions always hold plain bytes.

use bytes::Bytes;

use crate::config::StorageConfig;

/// How a body is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    Raw,
    Zstd,
}

impl BodyFormat {
    /// File extension used for bodies in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            BodyFormat::Raw => "body",
            BodyFormat::Zstd => "body.zst",
        }
    }
}

pub struct Compressor {
    enabled: bool,
    level: i32,
}

impl Compressor {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            enabled: config.compress,
            level: config.zstd_level,
        }
    }

    /// Encode a body for disk, returning the format actually used.
    ///
    /// Falls back to raw when compression would not make the body smaller.
    pub fn compress(&self, body: &[u8]) -> std::io::Result<(BodyFormat, Vec<u8>)> {
        if !self.enabled || body.is_empty() {
            return Ok((BodyFormat::Raw, body.to_vec()));
        }
        let compressed = zstd::encode_all(body, self.level)?;
        if compressed.len() >= body.len() {
            Ok((BodyFormat::Raw, body.to_vec()))
        } else {
            Ok((BodyFormat::Zstd, compressed))
        }
    }

    /// Decode a body read from disk.
    pub fn decompress(&self, data: &[u8], format: BodyFormat) -> std::io::Result<Bytes> {
        match format {
            BodyFormat::Raw => Ok(Bytes::copy_from_slice(data)),
            BodyFormat::Zstd => Ok(Bytes::from(zstd::decode_all(data)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zstd_roundtrip() {
        let compressor = Compressor::new(&StorageConfig::default());
        let data = vec![42u8; 4096];

        let (format, compressed) = compressor.compress(&data).unwrap();
        assert_eq!(format, BodyFormat::Zstd);
        assert!(compressed.len() < data.len());

        let decompressed = compressor.decompress(&compressed, format).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_disabled_or_incompressible_stays_raw() {
        let cfg = StorageConfig {
            compress: false,
            ..Default::default()
        };
        let (format, out) = Compressor::new(&cfg).compress(b"hello").unwrap();
        assert_eq!(format, BodyFormat::Raw);
        assert_eq!(out, b"hello");

        // Too short to benefit from zstd framing.
        let (format, _) = Compressor::new(&StorageConfig::default()).compress(b"ab").unwrap();
        assert_eq!(format, BodyFormat::Raw);
    }
}
