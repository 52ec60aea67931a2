//! Record transformation rules
//!
//! Each rule rewrites fields of a flat record in place. Rules are declared in
//! the feed definition and applied in order to every record before
//! serialization.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{JsonObject, JsonValue, StringMap};

/// A single field transformation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformRule {
    /// Convert numeric epoch-second fields to ISO-8601 UTC timestamps.
    ///
    /// Values below one are treated as sentinel "never" markers and become
    /// null rather than a 1970 timestamp.
    EpochDates {
        /// Fields to convert
        fields: Vec<String>,
    },
    /// Convert numeric flag fields to "Yes" or "No" strings
    YesNoFlags {
        /// Fields to convert
        fields: Vec<String>,
    },
    /// Rename fields using a static mapping
    RenameFields {
        /// Old name to new name
        mapping: StringMap,
    },
}

impl TransformRule {
    /// Apply this rule to a record in place
    pub fn apply(&self, record: &mut JsonObject) {
        match self {
            Self::EpochDates { fields } => {
                for field in fields {
                    if let Some(value) = record.get_mut(field) {
                        *value = epoch_to_iso(value);
                    }
                }
            }
            Self::YesNoFlags { fields } => {
                for field in fields {
                    if let Some(value) = record.get_mut(field) {
                        *value = flag_to_yes_no(value);
                    }
                }
            }
            Self::RenameFields { mapping } => {
                rename_fields(record, mapping);
            }
        }
    }
}

/// An ordered list of rules applied to every record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TransformChain {
    rules: Vec<TransformRule>,
}

impl TransformChain {
    /// Create a chain from a list of rules
    pub fn new(rules: Vec<TransformRule>) -> Self {
        Self { rules }
    }

    /// True when the chain has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules in the chain
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Append a rule to the end of the chain
    pub fn push(&mut self, rule: TransformRule) {
        self.rules.push(rule);
    }

    /// Apply every rule in order to a record
    pub fn apply(&self, record: &mut JsonObject) {
        for rule in &self.rules {
            rule.apply(record);
        }
    }
}

/// Convert an epoch-seconds value to an ISO-8601 UTC timestamp string.
///
/// Non-numeric values pass through unchanged. Values below one become null.
pub fn epoch_to_iso(value: &JsonValue) -> JsonValue {
    let epoch = match value {
        JsonValue::Number(n) => match n.as_i64() {
            Some(secs) => secs,
            None => return value.clone(),
        },
        JsonValue::String(s) => match s.trim().parse::<i64>() {
            Ok(secs) => secs,
            Err(_) => return value.clone(),
        },
        _ => return value.clone(),
    };

    if epoch < 1 {
        return JsonValue::Null;
    }

    match DateTime::<Utc>::from_timestamp(epoch, 0) {
        Some(ts) => JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        None => JsonValue::Null,
    }
}

/// Convert a numeric flag to "Yes" or "No". Zero is "No", any other number
/// is "Yes". Non-numeric values pass through unchanged.
pub fn flag_to_yes_no(value: &JsonValue) -> JsonValue {
    let flag = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    match flag {
        Some(f) if f == 0.0 => JsonValue::String("No".into()),
        Some(_) => JsonValue::String("Yes".into()),
        None => value.clone(),
    }
}

/// Rename record fields per the mapping, preserving field order.
///
/// Fields absent from the mapping keep their names. A mapping entry whose
/// target collides with an existing unmapped field overwrites it.
pub fn rename_fields(record: &mut JsonObject, mapping: &StringMap) {
    if mapping.is_empty() {
        return;
    }

    let old = std::mem::take(record);
    for (key, value) in old {
        let name = mapping.get(&key).cloned().unwrap_or(key);
        record.insert(name, value);
    }
}
