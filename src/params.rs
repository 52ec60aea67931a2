//! Host-supplied run parameters
//!
//! The hosting platform injects two objects into every feed run: the custom
//! parameters configured on the feed (credentials, base URL, query name) and
//! the read-only feed tokens set by the scheduler (`LastRunTime`,
//! `PreviousRunContext`). Both are carried in an explicit [`RunContext`]
//! constructed once at entry and threaded through every component, never
//! accessed as ambient globals.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};

/// Parameters and tokens for a single feed run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Custom parameters configured on the feed
    pub params: JsonObject,
    /// Scheduler-set tokens (read-only for the feed)
    pub tokens: JsonObject,
}

impl RunContext {
    /// Build a context from parameter and token JSON objects.
    ///
    /// Both values must be JSON objects; anything else is a configuration
    /// error from the host side.
    pub fn new(params: JsonValue, tokens: JsonValue) -> Result<Self> {
        Ok(Self {
            params: into_object(params, "params")?,
            tokens: into_object(tokens, "tokens")?,
        })
    }

    /// Build a context with parameters only (no scheduler tokens).
    pub fn from_params(params: JsonValue) -> Result<Self> {
        Self::new(params, JsonValue::Object(JsonObject::new()))
    }

    /// Look up a parameter as a string slice.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(JsonValue::as_str)
    }

    /// Look up a token as a string slice.
    pub fn token_str(&self, key: &str) -> Option<&str> {
        self.tokens.get(key).and_then(JsonValue::as_str)
    }

    /// Validate the declared required-parameter list.
    ///
    /// Fails with the first absent (or present-but-empty) key. Runs before any
    /// network call is made.
    pub fn validate_required(&self, required: &[String]) -> Result<()> {
        for key in required {
            match self.params.get(key.as_str()) {
                None | Some(JsonValue::Null) => return Err(Error::missing_param(key)),
                Some(JsonValue::String(s)) if s.is_empty() => {
                    return Err(Error::missing_param(key))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

fn into_object(value: JsonValue, what: &str) -> Result<JsonObject> {
    match value {
        JsonValue::Object(map) => Ok(map),
        JsonValue::Null => Ok(JsonObject::new()),
        other => Err(Error::invalid_value(
            what,
            format!("expected a JSON object, got {other}"),
        )),
    }
}
