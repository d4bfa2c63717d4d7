//! Runtime configuration for offline-worker.
//!
//! Configuration can be loaded from a JSON file or constructed programmatically.
//! Cache names, pinned asset lists and notification options live here and are
//! immutable once the worker starts.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "offline-worker", about = "Offline cache worker for a static site")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Site origin to forward network fetches to (overrides the config file).
    #[arg(long)]
    pub origin: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Cache names and pinned assets.
    pub worker: WorkerConfig,

    /// Push notification options.
    pub notifications: NotificationConfig,

    /// Snapshot persistence.
    pub storage: StorageConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8080").
    pub listen: String,

    /// Origin the site is served from; every network fetch goes here.
    pub origin: String,

    /// Origin request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            origin: "http://127.0.0.1:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Cache partition naming and the eagerly cached asset lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Prefix shared by both partition names.
    pub cache_prefix: String,

    /// Version tag embedded in partition names and reported by `GET_VERSION`.
    pub version: String,

    /// Paths loaded into the static partition at install.
    pub static_assets: Vec<String>,

    /// Paths loaded into the dynamic partition at install.
    pub dynamic_assets: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_prefix: "tis-design".to_string(),
            version: "1.0.0".to_string(),
            static_assets: [
                "/",
                "/index.html",
                "/immagini/logo_bianco.png",
                "/immagini/logo_nero.png",
                "/immagini/bg-neon.jpg",
                "/immagini/og-preview.jpg",
                "/immagini/carte/tshirt_viola.webp",
                "/immagini/carte/gadget_viola.webp",
                "/immagini/carte/vetrine_viola.webp",
                "/manifest.json",
                "/favicon.png",
                "/apple-touch-icon.png",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            dynamic_assets: vec![
                "/immagini/icon-192.png".to_string(),
                "/immagini/icon-512.png".to_string(),
            ],
        }
    }
}

impl WorkerConfig {
    /// Name of the partition holding the static asset list.
    pub fn static_cache_name(&self) -> String {
        format!("{}-static-v{}", self.cache_prefix, self.version)
    }

    /// Name of the partition holding opportunistically stored responses.
    pub fn dynamic_cache_name(&self) -> String {
        format!("{}-dynamic-v{}", self.cache_prefix, self.version)
    }

    /// Whether `path` is on either eagerly cached list.
    pub fn is_pinned(&self, path: &str) -> bool {
        self.static_assets.iter().any(|p| p == path)
            || self.dynamic_assets.iter().any(|p| p == path)
    }
}

/// Options applied to every notification shown from a push.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub icon: String,
    pub badge: String,
    /// Vibration pattern in milliseconds.
    pub vibrate: Vec<u32>,
    pub explore_title: String,
    pub close_title: String,
    /// Path opened when the `explore` action is clicked.
    pub open_path: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            icon: "/immagini/icon-192.png".to_string(),
            badge: "/immagini/icon-192.png".to_string(),
            vibrate: vec![100, 50, 100],
            explore_title: "Vedi offerta".to_string(),
            close_title: "Chiudi".to_string(),
            open_path: "/".to_string(),
        }
    }
}

/// Where (and how) partitions are persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Snapshot directory; `None` keeps the cache in memory only.
    pub snapshot_dir: Option<PathBuf>,

    /// Apply zstd compression to stored bodies.
    pub compress: bool,

    /// zstd compression level (1-22).
    pub zstd_level: i32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: None,
            compress: true,
            zstd_level: 3,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Apply command-line overrides on top of the loaded file.
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        if let Some(origin) = &cli.origin {
            self.server.origin = origin.clone();
        }
        self
    }
}
