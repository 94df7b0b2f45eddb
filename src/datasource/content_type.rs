//! Content type detection module
//!
//! Returns the content type tag of a document based on its file extension.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Content type tag attached to a retrieved document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Text,
    Xml,
    Json,
    JsonLd,
}

impl ContentType {
    pub const ALL: [Self; 4] = [Self::Text, Self::Xml, Self::Json, Self::JsonLd];

    /// Tag used as the response discriminator on the wire
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Xml => "xml",
            Self::Json => "json",
            Self::JsonLd => "json-ld",
        }
    }

    /// LAPPS vocabulary media URI for this content type
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Text => "http://vocab.lappsgrid.org/ns/media/text",
            Self::Xml => "http://vocab.lappsgrid.org/ns/media/xml",
            Self::Json => "http://vocab.lappsgrid.org/ns/media/json",
            Self::JsonLd => "http://vocab.lappsgrid.org/ns/media/jsonld",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ct| ct.tag() == s)
            .ok_or_else(|| format!("Unknown content type: {s}"))
    }
}

/// Extension to content type lookup table
///
/// Keys are stored lowercase and lookups are case-insensitive. The table is
/// built once at startup and never modified afterwards.
#[derive(Debug, Clone)]
pub struct ContentTypeMap {
    extensions: HashMap<String, ContentType>,
}

impl Default for ContentTypeMap {
    fn default() -> Self {
        let extensions = [
            ("txt", ContentType::Text),
            ("xml", ContentType::Xml),
            ("hdr", ContentType::Xml),
            ("json", ContentType::Json),
            ("jsonld", ContentType::JsonLd),
        ]
        .into_iter()
        .map(|(ext, ct)| (ext.to_string(), ct))
        .collect();

        Self { extensions }
    }
}

impl ContentTypeMap {
    /// Build the default table with additional or overriding mappings applied
    pub fn with_overrides<I, S>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, ContentType)>,
        S: AsRef<str>,
    {
        let mut map = Self::default();
        for (ext, ct) in overrides {
            let ext = ext.as_ref().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() {
                map.extensions.insert(ext, ct);
            }
        }
        map
    }

    /// Resolve the content type of a file name
    ///
    /// # Examples
    /// ```
    /// use docsource::datasource::{ContentType, ContentTypeMap};
    ///
    /// let map = ContentTypeMap::default();
    /// assert_eq!(map.resolve("a.JSON"), ContentType::Json);
    /// assert_eq!(map.resolve(".hidden"), ContentType::Text);
    /// assert_eq!(map.resolve("README"), ContentType::Text);
    /// ```
    pub fn resolve(&self, file_name: &str) -> ContentType {
        match file_name.rfind('.') {
            None | Some(0) => ContentType::Text,
            Some(dot) => self
                .extensions
                .get(&file_name[dot + 1..].to_lowercase())
                .copied()
                .unwrap_or(ContentType::Text),
        }
    }
}
