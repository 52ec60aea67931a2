//! Auth configuration types
//!
//! These types represent the runtime auth configuration after template
//! interpolation has been applied.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};

/// Location for API key placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Place in HTTP header
    #[default]
    Header,
    /// Place in query parameter
    Query,
}

/// Authentication configuration (after template interpolation)
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// HTTP Basic authentication
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// API Key authentication (header or query)
    ApiKey {
        /// Where to place the API key
        location: Location,
        /// Header name (for header location)
        header_name: Option<String>,
        /// Query parameter name (for query location)
        query_param: Option<String>,
        /// Prefix to add before the value (e.g., "Bearer ")
        prefix: Option<String>,
        /// The API key value
        value: String,
    },

    /// Static bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },

    /// Session-based authentication (login endpoint)
    ///
    /// Covers both cookie-style and bearer-style session artifacts: the
    /// extracted token is replayed in `token_header` with an optional prefix.
    Session {
        /// Login endpoint URL
        login_url: String,
        /// HTTP method for login (POST by default)
        login_method: reqwest::Method,
        /// Login request body (JSON)
        login_body: JsonValue,
        /// JSON path to extract the session token from the response
        token_path: String,
        /// Header name to replay the token in (e.g., "Cookie", "X-ApiSession")
        token_header: String,
        /// Prefix for the token value (e.g., "TOKEN=")
        token_prefix: Option<String>,
    },
}

/// Session artifact obtained from a login endpoint.
///
/// Run-scoped: fetched at most once per feed run and discarded with the run.
/// There is no cross-run caching.
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// The raw token value
    pub token: String,
}

impl SessionToken {
    /// Create a new session token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert!(matches!(config, AuthConfig::None));
    }

    #[test]
    fn test_location_serde() {
        let loc: Location = serde_json::from_str("\"query\"").unwrap();
        assert_eq!(loc, Location::Query);
        assert_eq!(Location::default(), Location::Header);
    }

    #[test]
    fn test_session_token() {
        let token = SessionToken::new("abc123");
        assert_eq!(token.token, "abc123");
    }
}
