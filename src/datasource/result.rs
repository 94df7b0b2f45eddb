//! Tagged result module
//!
//! Every dispatcher outcome is a [`DataResult`]. On the wire it is always an
//! object of the shape `{"type": <tag>, "payload": <value>}`:
//!
//! | variant    | tag                                | payload          |
//! |------------|------------------------------------|------------------|
//! | `Size`     | `size`                             | integer          |
//! | `Keys`     | `list`                             | array of strings |
//! | `Matches`  | `index`                            | array of strings |
//! | `Document` | `text`, `xml`, `json` or `json-ld` | string           |
//! | `Metadata` | `metadata`                         | string           |
//! | `Error`    | `error`                            | string           |

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use super::content_type::ContentType;

pub const TAG_SIZE: &str = "size";
pub const TAG_LIST: &str = "list";
pub const TAG_INDEX: &str = "index";
pub const TAG_METADATA: &str = "metadata";
pub const TAG_ERROR: &str = "error";

/// Outcome of a single dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataResult {
    /// Number of keys in the index
    Size(usize),
    /// Keys from a `list` request, in index order
    Keys(Vec<String>),
    /// Keys whose backing path matched a `query` request, in index order
    Matches(Vec<String>),
    /// Full text of a document
    Document {
        content_type: ContentType,
        text: String,
    },
    /// Service metadata
    Metadata(String),
    /// Human readable failure message
    Error(String),
}

impl DataResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Response discriminator
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Size(_) => TAG_SIZE,
            Self::Keys(_) => TAG_LIST,
            Self::Matches(_) => TAG_INDEX,
            Self::Document { content_type, .. } => content_type.tag(),
            Self::Metadata(_) => TAG_METADATA,
            Self::Error(_) => TAG_ERROR,
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Error message, if this is an error result
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl Serialize for DataResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DataResult", 2)?;
        state.serialize_field("type", self.tag())?;
        match self {
            Self::Size(n) => state.serialize_field("payload", n)?,
            Self::Keys(keys) | Self::Matches(keys) => state.serialize_field("payload", keys)?,
            Self::Document { text, .. } => state.serialize_field("payload", text)?,
            Self::Metadata(s) | Self::Error(s) => state.serialize_field("payload", s)?,
        }
        state.end()
    }
}

/// Failure to decode a response document
#[derive(Error, Debug)]
pub enum WireError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown response type: {0}")]
    UnknownTag(String),

    #[error("payload of a '{tag}' response must be {expected}")]
    PayloadShape { tag: String, expected: &'static str },
}

#[derive(Deserialize)]
struct WireResult {
    #[serde(rename = "type")]
    tag: String,
    payload: serde_json::Value,
}

impl TryFrom<WireResult> for DataResult {
    type Error = WireError;

    fn try_from(wire: WireResult) -> Result<Self, WireError> {
        fn shape(tag: &str, expected: &'static str) -> WireError {
            WireError::PayloadShape {
                tag: tag.to_string(),
                expected,
            }
        }

        let WireResult { tag, payload } = wire;
        match tag.as_str() {
            TAG_SIZE => payload
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Self::Size)
                .ok_or_else(|| shape(&tag, "a non-negative integer")),
            TAG_LIST | TAG_INDEX => {
                let keys: Vec<String> = serde_json::from_value(payload)
                    .map_err(|_| shape(&tag, "an array of strings"))?;
                Ok(if tag == TAG_LIST {
                    Self::Keys(keys)
                } else {
                    Self::Matches(keys)
                })
            }
            TAG_METADATA | TAG_ERROR => {
                let serde_json::Value::String(text) = payload else {
                    return Err(shape(&tag, "a string"));
                };
                Ok(if tag == TAG_ERROR {
                    Self::Error(text)
                } else {
                    Self::Metadata(text)
                })
            }
            other => {
                let content_type: ContentType = other
                    .parse()
                    .map_err(|_| WireError::UnknownTag(other.to_string()))?;
                let serde_json::Value::String(text) = payload else {
                    return Err(shape(&tag, "a string"));
                };
                Ok(Self::Document { content_type, text })
            }
        }
    }
}

/// Serialize a result into its wire form
pub fn to_wire(result: &DataResult) -> String {
    serde_json::to_string(result).unwrap_or_else(|e| {
        crate::logger::log_error(&format!("Failed to serialize result: {e}"));
        r#"{"type":"error","payload":"Internal server error"}"#.to_string()
    })
}

/// Parse a result from its wire form
pub fn from_wire(raw: &str) -> Result<DataResult, WireError> {
    let wire: WireResult = serde_json::from_str(raw)?;
    DataResult::try_from(wire)
}
