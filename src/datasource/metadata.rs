//! Service metadata module
//!
//! The metadata string is fixed for the life of the service. It is either
//! supplied by the operator (inline or from a file) or generated here.

use serde::Serialize;
use std::io;
use std::path::Path;

use super::content_type::ContentType;
use super::request::Operation;

/// Produced format entry
#[derive(Debug, Clone, Serialize)]
pub struct FormatInfo {
    pub tag: &'static str,
    pub uri: &'static str,
}

/// Generated description of this service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub operations: Vec<&'static str>,
    pub produces: Vec<FormatInfo>,
}

impl ServiceMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Read-only document retrieval over a key to file index".to_string(),
            operations: Operation::ALL.iter().map(|op| op.tag()).collect(),
            produces: ContentType::ALL
                .iter()
                .map(|ct| FormatInfo {
                    tag: ct.tag(),
                    uri: ct.uri(),
                })
                .collect(),
        }
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            crate::logger::log_error(&format!("Failed to serialize service metadata: {e}"));
            format!(r#"{{"name":"{}"}}"#, self.name)
        })
    }
}

/// Pick the metadata string: inline text first, then file, then generated
pub fn load_metadata(text: Option<&str>, file: Option<&Path>, name: &str) -> io::Result<String> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path);
    }
    Ok(ServiceMetadata::new(name).to_json_string())
}
