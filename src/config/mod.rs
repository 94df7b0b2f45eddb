// Configuration module entry point
// Loads layered configuration and assembles the data source from it

mod state;
mod types;

use std::net::SocketAddr;

pub use state::{build_data_source, AppState};
pub use types::{
    Config, HttpConfig, IndexConfig, LoggingConfig, MetadataConfig, PerformanceConfig,
    ServerConfig,
};

use crate::datasource::ContentTypeMap;
use crate::index::{DirectoryScan, IndexError, MemoryIndex};

/// Environment variable prefix, e.g. `DOCSOURCE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "DOCSOURCE";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, environment())
    }

    /// Load configuration with an explicit environment layer
    fn load_with_env(
        config_path: &str,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.name", "docsource")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 128)?
            .set_default("index.recursive", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_grace", 5)?
            .set_default("http.server_name", "docsource/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(env)
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn content_type_map(&self) -> ContentTypeMap {
        ContentTypeMap::with_overrides(self.content_types.iter().map(|(ext, ct)| (ext, *ct)))
    }
}

/// `DOCSOURCE_` prefix, `__` between section and key
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

impl IndexConfig {
    /// Build the in-memory index from the configured source
    pub fn build(&self) -> Result<MemoryIndex, IndexError> {
        if let Some(manifest) = &self.manifest {
            return MemoryIndex::from_manifest(manifest);
        }
        if let Some(root) = &self.root {
            let scan = DirectoryScan {
                recursive: self.recursive,
                extensions: self.extensions.clone(),
            };
            return MemoryIndex::from_directory(root, &scan);
        }
        Err(IndexError::NotConfigured)
    }

    /// Human readable description of the index source, for logging
    pub fn describe(&self) -> String {
        match (&self.manifest, &self.root) {
            (Some(manifest), _) => format!("manifest {}", manifest.display()),
            (None, Some(root)) => format!("directory {}", root.display()),
            (None, None) => "nowhere".to_string(),
        }
    }
}
