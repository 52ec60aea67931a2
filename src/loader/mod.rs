//! Feed definition loader
//!
//! Loads declarative feed definitions from YAML. A definition names the
//! endpoint, auth scheme, pagination fields, transforms, and output shape;
//! templates inside it are resolved against the run parameters at run time.

mod parser;
mod types;

pub use parser::{load_feed, load_feed_from_str};
pub use types::{
    AuthDefinition, FeedDefinition, HttpDefinition, PaginationDefinition, RequestDefinition,
};
