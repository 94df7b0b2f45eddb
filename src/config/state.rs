// Application state module
// Shared runtime state and data source assembly

use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::Arc;

use super::types::Config;
use crate::datasource::{load_metadata, DataSource, ServiceMetadata};
use crate::index::Index;
use crate::logger;

/// Application state shared by every connection
pub struct AppState {
    pub config: Config,
    pub datasource: Arc<DataSource>,

    // Cached config values for fast access without locks
    pub cached_access_log: AtomicBool,

    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config, datasource: DataSource) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            datasource: Arc::new(datasource),
            cached_access_log,
            active_connections: AtomicUsize::new(0),
        }
    }
}

/// Build the data source described by `config`
///
/// Index and metadata failures do not abort startup; they produce a data
/// source in the failed state that answers every request with the reason.
pub fn build_data_source(config: &Config) -> DataSource {
    let metadata = match load_metadata(
        config.metadata.text.as_deref(),
        config.metadata.file.as_deref(),
        &config.server.name,
    ) {
        Ok(metadata) => metadata,
        Err(e) => {
            let reason = format!("Unable to load service metadata: {e}");
            logger::log_service_failed(&reason);
            return DataSource::failed(
                reason,
                ServiceMetadata::new(&config.server.name).to_json_string(),
            );
        }
    };

    match config.index.build() {
        Ok(index) => {
            logger::log_index_loaded(&config.index.describe(), index.len());
            DataSource::new(index, metadata).with_content_types(config.content_type_map())
        }
        Err(e) => {
            let reason = format!("Unable to load index: {e}");
            logger::log_service_failed(&reason);
            DataSource::failed(reason, metadata)
        }
    }
}
