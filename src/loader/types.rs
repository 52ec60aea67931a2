//! Loader types
//!
//! Declarative feed definition types for YAML parsing. Values may contain
//! `{{ params.* }}` and `{{ tokens.* }}` templates resolved at run time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::transform::{DictionarySource, TransformChain};
use crate::types::{FetchMode, JsonValue, Method, RetryStyle};
use crate::xml::XmlOptions;

// ============================================================================
// Feed Definition
// ============================================================================

/// Top-level feed definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FeedDefinition {
    /// Feed name
    pub name: String,
    /// Feed version
    #[serde(default = "default_version")]
    pub version: String,
    /// Human description
    #[serde(default)]
    pub description: Option<String>,
    /// Run parameters that must be present and non-empty before any request
    #[serde(default)]
    pub required_params: Vec<String>,
    /// Authentication configuration
    #[serde(default)]
    pub auth: Option<AuthDefinition>,
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpDefinition,
    /// The data endpoint request
    pub request: RequestDefinition,
    /// JSON path to the records array in each page. Empty means the body
    /// itself is the array.
    #[serde(default)]
    pub records_path: String,
    /// Pagination configuration
    #[serde(default)]
    pub pagination: PaginationDefinition,
    /// Field transformations applied to every record, in order
    #[serde(default)]
    pub transforms: TransformChain,
    /// Metadata endpoint providing per-run field renames, applied after
    /// the transform chain
    #[serde(default)]
    pub field_dictionary: Option<DictionarySource>,
    /// XML output shape
    #[serde(default)]
    pub xml: XmlOptions,
    /// Parameter or token echoed back as the run context for the next run
    #[serde(default)]
    pub run_context_param: Option<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

// ============================================================================
// Auth Definition
// ============================================================================

/// Authentication definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthDefinition {
    /// No authentication
    None,
    /// Basic authentication
    Basic {
        /// Username (template)
        username: String,
        /// Password (template)
        password: String,
    },
    /// API key in a header or query parameter
    ApiKey {
        /// Header or query parameter name
        key: String,
        /// Value (template)
        value: String,
        /// Location: header or query
        #[serde(default = "default_auth_location")]
        location: String,
        /// Prefix placed before the value
        #[serde(default)]
        prefix: Option<String>,
    },
    /// Static bearer token
    Bearer {
        /// Token value (template)
        token: String,
    },
    /// Session token obtained from a login endpoint
    SessionToken {
        /// Login URL (template)
        login_url: String,
        /// Login HTTP method
        #[serde(default = "default_post_method")]
        method: Method,
        /// Login request body (templates in values)
        #[serde(default)]
        body: JsonValue,
        /// JSON path to the session token in the login response
        token_path: String,
        /// Header the token is replayed in
        header_name: String,
        /// Prefix placed before the token value
        #[serde(default)]
        header_prefix: Option<String>,
    },
}

fn default_auth_location() -> String {
    "header".to_string()
}

fn default_post_method() -> Method {
    Method::POST
}

// ============================================================================
// HTTP Definition
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpDefinition {
    /// Base URL for all requests (template)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retries after the first attempt
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay between retries in milliseconds
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,
    /// Delay strategy
    #[serde(default)]
    pub retry_style: RetryStyle,
    /// Rate limit (requests per second)
    #[serde(default)]
    pub rate_limit_rps: Option<u32>,
    /// Headers sent with every request (templates in values)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// User agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpDefinition {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            retry_interval_ms: default_retry_interval(),
            retry_style: RetryStyle::default(),
            rate_limit_rps: None,
            headers: HashMap::new(),
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    9
}

fn default_retry_interval() -> u64 {
    2500
}

// ============================================================================
// Request Definition
// ============================================================================

/// The data endpoint request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestDefinition {
    /// HTTP method
    #[serde(default)]
    pub method: Method,
    /// URL, absolute or relative to the base URL (template)
    pub url: String,
    /// Request headers (templates in values)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Query parameters (templates in values)
    #[serde(default)]
    pub params: HashMap<String, String>,
    /// JSON request body (templates in values)
    #[serde(default)]
    pub body: Option<JsonValue>,
    /// Urlencoded form body (templates in values)
    #[serde(default)]
    pub form: Option<HashMap<String, String>>,
    /// How the response body is read
    #[serde(default)]
    pub fetch_mode: FetchMode,
}

// ============================================================================
// Pagination Definition
// ============================================================================

/// Offset pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PaginationDefinition {
    /// Offset parameter name
    #[serde(default = "default_offset_param")]
    pub offset_param: String,
    /// Page size parameter name
    #[serde(default = "default_size_param")]
    pub size_param: String,
    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// JSON path to the total record count in each page
    #[serde(default = "default_total_path")]
    pub total_path: String,
}

impl Default for PaginationDefinition {
    fn default() -> Self {
        Self {
            offset_param: default_offset_param(),
            size_param: default_size_param(),
            page_size: default_page_size(),
            total_path: default_total_path(),
        }
    }
}

fn default_offset_param() -> String {
    "offset".to_string()
}

fn default_size_param() -> String {
    "pageSize".to_string()
}

fn default_page_size() -> u64 {
    50
}

fn default_total_path() -> String {
    "totalCount".to_string()
}
