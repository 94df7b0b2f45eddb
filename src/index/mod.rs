//! Key to file index
//!
//! The data source only reads through the [`Index`] trait. [`MemoryIndex`]
//! is the implementation the server builds at startup.

mod memory;

pub use memory::{DirectoryScan, Manifest, ManifestEntry, MemoryIndex};

use std::path::PathBuf;
use thiserror::Error;

/// Read-only mapping from document keys to backing files
///
/// Implementations must tolerate concurrent calls from multiple requests.
pub trait Index: Send + Sync {
    /// All keys, in a stable enumeration order
    fn keys(&self) -> Vec<String>;

    /// Backing file of `key`, or `None` when the key is unknown
    fn get(&self, key: &str) -> Option<PathBuf>;

    /// Number of keys
    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Failure while building an index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("no index source configured (set index.root or index.manifest)")]
    NotConfigured,

    #[error("index root not found: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid index manifest: {0}")]
    Manifest(#[from] toml::de::Error),

    #[error("duplicate index key: {0}")]
    DuplicateKey(String),
}
