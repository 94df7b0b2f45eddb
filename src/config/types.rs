// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::datasource::ContentType;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Extra extension to content type mappings, e.g. `lif = "json"`
    #[serde(default)]
    pub content_types: HashMap<String, ContentType>,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Service name reported in generated metadata
    pub name: String,
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Listen backlog
    pub backlog: i32,
}

/// Index source configuration
///
/// `manifest` takes precedence over `root` when both are set.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct IndexConfig {
    /// Directory to scan
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// TOML manifest listing keys and paths
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    /// Extensions to include in a directory scan, empty for all
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
}

/// Metadata returned by `get-metadata`
///
/// Inline `text` wins over `file`; with neither, metadata is generated.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct MetadataConfig {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight connections on shutdown
    pub shutdown_grace: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}
