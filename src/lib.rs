//! # Datafeed Kit
//!
//! A toolkit for building paginated fetch-transform datafeeds: authenticate
//! against an upstream API, page through an offset-paginated endpoint,
//! transform each record, and serialize the result into a single XML
//! document handed back to the hosting platform.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use datafeed_kit::engine::FeedRunner;
//! use datafeed_kit::loader::load_feed;
//! use datafeed_kit::params::RunContext;
//!
//! #[tokio::main]
//! async fn main() {
//!     let def = load_feed("feeds/assets.yaml").unwrap();
//!     let ctx = RunContext::from_params(serde_json::json!({
//!         "api_url": "https://api.example.com",
//!         "api_key": "sk-123"
//!     }))
//!     .unwrap();
//!
//!     // Always settles into exactly one completion envelope
//!     let completion = FeedRunner::new(def, ctx).run_to_completion().await;
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FeedRunner                           │
//! │  validate → authenticate → prepare → paginate → finalize    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────┬───────────┬─────┴─────┬────────────┬─────────────┐
//! │   Auth   │   HTTP    │ Paginate  │ Transform  │    XML      │
//! ├──────────┼───────────┼───────────┼────────────┼─────────────┤
//! │ API Key  │ Retry     │ Offset    │ Epoch date │ RECORD els  │
//! │ Session  │ Throttle  │ Total     │ Yes/No     │ DATA root   │
//! │ Basic    │ Stream    │ Probe     │ Rename     │ Buffer      │
//! └──────────┴───────────┴───────────┴────────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the kit
pub mod error;

/// Common types and type aliases
pub mod types;

/// Host-supplied run parameters and tokens
pub mod params;

/// Template interpolation
pub mod template;

/// Authentication implementations
pub mod auth;

/// HTTP client with retry and throttling
pub mod http;

/// Offset pagination
pub mod pagination;

/// Record transformations
pub mod transform;

/// XML serialization and output writers
pub mod xml;

/// YAML loader for feed definitions
pub mod loader;

/// Resolved feed configuration
pub mod feed;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use engine::{FeedCompletion, FeedOutput, FeedRunner};
pub use loader::{load_feed, load_feed_from_str, FeedDefinition};
pub use params::RunContext;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
