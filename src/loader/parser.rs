//! YAML parser for feed definitions
//!
//! Parses and validates feed YAML files.

use crate::error::{Error, Result};
use crate::loader::types::FeedDefinition;
use std::fs;
use std::path::Path;

/// Load a feed definition from a YAML file
pub fn load_feed(path: impl AsRef<Path>) -> Result<FeedDefinition> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read feed file '{}': {}",
            path.display(),
            e
        ))
    })?;
    load_feed_from_str(&content)
}

/// Load a feed definition from a YAML string
pub fn load_feed_from_str(yaml: &str) -> Result<FeedDefinition> {
    let def: FeedDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse feed YAML: {e}")))?;

    validate_feed(&def)?;
    Ok(def)
}

/// Validate a feed definition
fn validate_feed(def: &FeedDefinition) -> Result<()> {
    if def.name.is_empty() {
        return Err(Error::config("Feed name cannot be empty"));
    }

    if def.request.url.is_empty() {
        return Err(Error::config(format!(
            "Feed '{}' request url cannot be empty",
            def.name
        )));
    }

    if def.pagination.page_size == 0 {
        return Err(Error::invalid_value(
            "pagination.page_size",
            "must be at least 1",
        ));
    }

    if def.pagination.total_path.is_empty() {
        return Err(Error::invalid_value(
            "pagination.total_path",
            "cannot be empty",
        ));
    }

    if def.http.timeout_secs == 0 {
        return Err(Error::invalid_value("http.timeout_secs", "must be at least 1"));
    }

    let mut seen = std::collections::HashSet::new();
    for param in &def.required_params {
        if param.is_empty() {
            return Err(Error::invalid_value("required_params", "cannot contain empty names"));
        }
        if !seen.insert(param) {
            return Err(Error::invalid_value(
                "required_params",
                format!("duplicate entry '{param}'"),
            ));
        }
    }

    if let Some(dict) = &def.field_dictionary {
        if dict.url.is_empty() {
            return Err(Error::invalid_value("field_dictionary.url", "cannot be empty"));
        }
        if dict.key_field.is_empty() || dict.label_field.is_empty() {
            return Err(Error::invalid_value(
                "field_dictionary",
                "key_field and label_field are required",
            ));
        }
    }

    Ok(())
}
