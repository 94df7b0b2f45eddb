//! Request decoding module
//!
//! Turns the loosely typed request object received on the wire into a
//! validated [`Query`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{DataSourceError, Result};

/// Operations understood by the data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Size,
    List,
    Get,
    Query,
    GetMetadata,
}

impl Operation {
    pub const ALL: [Self; 5] = [
        Self::Size,
        Self::List,
        Self::Get,
        Self::Query,
        Self::GetMetadata,
    ];

    /// Request discriminator value
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::List => "list",
            Self::Get => "get",
            Self::Query => "query",
            Self::GetMetadata => "get-metadata",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Operation {
    type Err = DataSourceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.tag() == s)
            .ok_or_else(|| DataSourceError::UnsupportedOperation(s.to_string()))
    }
}

/// List offset as sent by clients, either a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Offset {
    Number(i64),
    Text(String),
}

impl Offset {
    fn to_index(&self, field: &'static str) -> Result<usize> {
        let parsed = match self {
            Self::Number(n) => usize::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse::<usize>().ok(),
        };
        parsed.ok_or_else(|| DataSourceError::InvalidOffset {
            field,
            value: self.to_string(),
        })
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<usize> for Offset {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Text(value.to_string()), Self::Number)
    }
}

/// Raw request object
///
/// Fields not used by the selected operation are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Offset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Offset>,
    #[serde(
        rename = "query-string",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub query_string: Option<String>,
}

impl Request {
    pub fn new(operation: Operation) -> Self {
        Self {
            kind: Some(operation.tag().to_string()),
            ..Self::default()
        }
    }

    /// Parse a request from its JSON text form
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode a request from an already parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_start(mut self, start: impl Into<Offset>) -> Self {
        self.start = Some(start.into());
        self
    }

    #[must_use]
    pub fn with_end(mut self, end: impl Into<Offset>) -> Self {
        self.end = Some(end.into());
        self
    }

    #[must_use]
    pub fn with_query_string(mut self, query: impl Into<String>) -> Self {
        self.query_string = Some(query.into());
        self
    }

    /// Request type as sent, for logging
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("-")
    }
}

/// Validated request, one variant per operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Size,
    List {
        start: Option<usize>,
        end: Option<usize>,
    },
    Get {
        key: String,
    },
    Query {
        needle: String,
    },
    GetMetadata,
}

impl Query {
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Size => Operation::Size,
            Self::List { .. } => Operation::List,
            Self::Get { .. } => Operation::Get,
            Self::Query { .. } => Operation::Query,
            Self::GetMetadata => Operation::GetMetadata,
        }
    }
}

impl TryFrom<&Request> for Query {
    type Error = DataSourceError;

    fn try_from(request: &Request) -> Result<Self> {
        let operation: Operation = request
            .kind
            .as_deref()
            .ok_or(DataSourceError::MissingType)?
            .parse()?;

        match operation {
            Operation::Size => Ok(Self::Size),
            Operation::List => Ok(Self::List {
                start: request
                    .start
                    .as_ref()
                    .map(|o| o.to_index("start"))
                    .transpose()?,
                end: request
                    .end
                    .as_ref()
                    .map(|o| o.to_index("end"))
                    .transpose()?,
            }),
            Operation::Get => match request.key.as_deref() {
                Some(key) if !key.is_empty() => Ok(Self::Get {
                    key: key.to_string(),
                }),
                _ => Err(DataSourceError::MissingKey),
            },
            Operation::Query => request
                .query_string
                .clone()
                .map(|needle| Self::Query { needle })
                .ok_or(DataSourceError::MissingQueryString),
            Operation::GetMetadata => Ok(Self::GetMetadata),
        }
    }
}
