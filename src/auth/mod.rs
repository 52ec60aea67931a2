//! Authentication module
//!
//! Supports: Basic, API Key, Bearer, and Session login.
//!
//! The `Authenticator` produces a run-scoped session artifact for schemes
//! that need one and applies the right credentials to every request.

mod authenticator;
mod types;

pub use authenticator::{extract_json_path, extract_json_value, Authenticator};
pub use types::{AuthConfig, Location, SessionToken};
