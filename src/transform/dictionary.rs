//! Per-run field dictionaries
//!
//! Some endpoints expose machine field names and publish the human labels on
//! a separate metadata endpoint. A dictionary source describes that endpoint;
//! the fetched dictionary becomes a rename mapping for the run.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{extract_json_path, extract_json_value};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::types::{JsonValue, StringMap};

use super::rules::TransformRule;

/// Where and how to fetch a field dictionary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DictionarySource {
    /// Metadata endpoint URL, absolute or relative to the client base
    pub url: String,
    /// JSON path to the array of dictionary entries
    #[serde(default)]
    pub records_path: String,
    /// Entry field holding the machine name
    pub key_field: String,
    /// Entry field holding the display label
    pub label_field: String,
}

/// A machine-name to display-label mapping fetched at run time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDictionary {
    mapping: StringMap,
}

impl FieldDictionary {
    /// Fetch the dictionary from its metadata endpoint.
    ///
    /// Entries missing either field are skipped. An entirely empty result is
    /// an error so a broken metadata endpoint fails the run loudly instead of
    /// emitting unrenamed output.
    pub async fn fetch(client: &HttpClient, source: &DictionarySource) -> Result<Self> {
        let body = client.get_json(&source.url).await?;

        let dictionary = parse_dictionary(&body, source)?;
        if dictionary.is_empty() {
            return Err(Error::parse(format!(
                "field dictionary at '{}' produced no usable entries",
                source.url
            )));
        }

        debug!(entries = dictionary.len(), url = %source.url, "Fetched field dictionary");
        Ok(dictionary)
    }

    /// Build a dictionary from an already-parsed mapping
    pub fn from_mapping(mapping: StringMap) -> Self {
        Self { mapping }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// True when the dictionary has no entries
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Look up the label for a machine name
    pub fn label(&self, key: &str) -> Option<&str> {
        self.mapping.get(key).map(String::as_str)
    }

    /// Convert into a rename rule
    pub fn into_rename_rule(self) -> TransformRule {
        TransformRule::RenameFields {
            mapping: self.mapping,
        }
    }
}

/// Parse dictionary entries out of a raw metadata body without a client.
/// Used by tests and by callers that fetch the body themselves.
pub fn parse_dictionary(body: &JsonValue, source: &DictionarySource) -> Result<FieldDictionary> {
    let entries = extract_json_value(body, &source.records_path)
        .and_then(|v| v.as_array().cloned())
        .ok_or_else(|| {
            Error::parse(format!(
                "field dictionary response has no array at '{}'",
                source.records_path
            ))
        })?;

    let mut mapping = StringMap::new();
    for entry in &entries {
        let key = extract_json_path(entry, &source.key_field);
        let label = extract_json_path(entry, &source.label_field);
        if let (Some(key), Some(label)) = (key, label) {
            mapping.insert(key, label);
        }
    }

    Ok(FieldDictionary { mapping })
}
