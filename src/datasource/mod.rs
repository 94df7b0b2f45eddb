//! Data source module
//!
//! Request dispatch over a key to file [`Index`]. A request is decoded into a
//! [`Query`], executed, and the outcome returned as a [`DataResult`]. Every
//! failure is folded into an `error` result; dispatch never panics and never
//! returns `Err`.

mod content_type;
mod error;
mod metadata;
mod reader;
mod request;
mod result;

pub use content_type::{ContentType, ContentTypeMap};
pub use error::DataSourceError;
pub use metadata::{load_metadata, FormatInfo, ServiceMetadata};
pub use reader::{DocumentReader, Utf8Reader};
pub use request::{Offset, Operation, Query, Request};
pub use result::{from_wire, to_wire, DataResult, WireError};

use std::path::Path;

use crate::index::Index;
use crate::logger;
use error::Result;

/// Whether the service came up with a usable index
enum ServiceState {
    Ready(Box<dyn Index>),
    /// Initialization failed; every request is answered with this message
    Failed(String),
}

/// Read-only document service over an index
pub struct DataSource {
    state: ServiceState,
    metadata: String,
    content_types: ContentTypeMap,
    reader: Box<dyn DocumentReader>,
}

impl DataSource {
    /// Service backed by `index`, using the default content types and a UTF-8 reader
    pub fn new(index: impl Index + 'static, metadata: impl Into<String>) -> Self {
        Self {
            state: ServiceState::Ready(Box::new(index)),
            metadata: metadata.into(),
            content_types: ContentTypeMap::default(),
            reader: Box::new(Utf8Reader),
        }
    }

    /// Service that refuses every request with `reason`
    pub fn failed(reason: impl Into<String>, metadata: impl Into<String>) -> Self {
        Self {
            state: ServiceState::Failed(reason.into()),
            metadata: metadata.into(),
            content_types: ContentTypeMap::default(),
            reader: Box::new(Utf8Reader),
        }
    }

    #[must_use]
    pub fn with_content_types(mut self, content_types: ContentTypeMap) -> Self {
        self.content_types = content_types;
        self
    }

    #[must_use]
    pub fn with_reader(mut self, reader: impl DocumentReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self.state, ServiceState::Ready(_))
    }

    /// Failure reason of a service that could not start
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            ServiceState::Ready(_) => None,
            ServiceState::Failed(reason) => Some(reason),
        }
    }

    /// Execute a decoded request
    pub fn dispatch(&self, request: &Request) -> DataResult {
        let index = match &self.state {
            ServiceState::Ready(index) => index.as_ref(),
            ServiceState::Failed(reason) => return DataResult::error(reason.clone()),
        };

        Query::try_from(request)
            .and_then(|query| self.execute(index, query))
            .unwrap_or_else(|e| DataResult::error(e.to_string()))
    }

    /// Execute a request given as a JSON value
    pub fn dispatch_value(&self, value: serde_json::Value) -> DataResult {
        if let Some(reason) = self.failure() {
            return DataResult::error(reason);
        }
        match Request::from_value(value) {
            Ok(request) => self.dispatch(&request),
            Err(e) => DataResult::error(e.to_string()),
        }
    }

    /// Execute a request given as JSON text and serialize the result
    pub fn dispatch_wire(&self, raw: &str) -> String {
        let result = if let Some(reason) = self.failure() {
            DataResult::error(reason)
        } else {
            match Request::parse(raw) {
                Ok(request) => self.dispatch(&request),
                Err(e) => DataResult::error(e.to_string()),
            }
        };
        to_wire(&result)
    }

    fn execute(&self, index: &dyn Index, query: Query) -> Result<DataResult> {
        logger::log_debug(&format!("Dispatching {}", query.operation()));
        match query {
            Query::Size => Ok(DataResult::Size(index.len())),
            Query::List { start, end } => list(index, start, end).map(DataResult::Keys),
            Query::Get { key } => self.get(index, &key),
            Query::Query { needle } => Ok(DataResult::Matches(find_by_path(index, &needle))),
            Query::GetMetadata => Ok(DataResult::Metadata(self.metadata.clone())),
        }
    }

    fn get(&self, index: &dyn Index, key: &str) -> Result<DataResult> {
        logger::log_info(&format!("Getting document for {key}"));

        let Some(path) = index.get(key) else {
            logger::log_error(&format!("No such file: {key}"));
            return Err(DataSourceError::NoSuchKey);
        };
        if !path.exists() {
            logger::log_error(&format!(
                "File not found for {key}: {}",
                path.display()
            ));
            return Err(DataSourceError::FileNotFound);
        }

        let content_type = self.content_types.resolve(&file_name(&path));
        let text = self.reader.read(&path).map_err(|e| {
            logger::log_error(&format!("Unable to load {}: {e}", path.display()));
            e
        })?;
        logger::log_debug(&format!(
            "Loaded {} ({} bytes, {content_type})",
            path.display(),
            text.len()
        ));

        Ok(DataResult::Document { content_type, text })
    }
}

/// Slice `[start, end)` of the index keys
///
/// Missing bounds default to the whole list. Bounds outside the key list are
/// rejected rather than clamped.
fn list(index: &dyn Index, start: Option<usize>, end: Option<usize>) -> Result<Vec<String>> {
    let keys = index.keys();
    let len = keys.len();
    let start = start.unwrap_or(0);
    let end = end.unwrap_or(len);

    if start > end || end > len {
        return Err(DataSourceError::RangeOutOfBounds { start, end, len });
    }

    Ok(keys[start..end].to_vec())
}

/// Keys whose backing path contains `needle`, in index order
fn find_by_path(index: &dyn Index, needle: &str) -> Vec<String> {
    index
        .keys()
        .into_iter()
        .filter(|key| {
            index
                .get(key)
                .is_some_and(|path| path.to_string_lossy().contains(needle))
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
