use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lazyrest_store::{DocumentStore, FsDocumentStore, InMemoryDocumentStore};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    pub debug: bool,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            storage: StorageConfig::default(),
            debug: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Keep documents in process memory only.
    pub in_memory: bool,
    /// Root directory of the filesystem backend.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { in_memory: false, data_dir: PathBuf::from(DEFAULT_DATA_DIR) }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    /// Keep the bind address but listen on `port`.
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Build the configured storage backend.
    pub fn open_store(&self) -> ServerResult<Arc<dyn DocumentStore>> {
        if self.storage.in_memory {
            return Ok(Arc::new(InMemoryDocumentStore::new()));
        }
        Ok(Arc::new(FsDocumentStore::open(&self.storage.data_dir)?))
    }

    /// Short description of the backend for start-up logging.
    pub fn storage_label(&self) -> String {
        if self.storage.in_memory {
            "memory".to_string()
        } else {
            format!("filesystem at {}", self.storage.data_dir.display())
        }
    }
}
