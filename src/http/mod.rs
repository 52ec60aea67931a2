//! HTTP client module
//!
//! Provides the retrying requester used by every feed.
//!
//! # Features
//!
//! - **Automatic Retries**: fixed or linearly incrementing delay
//! - **Throttling**: token bucket limiter using governor
//! - **Body Modes**: buffered or chunk-accumulating streamed reads
//! - **Authentication**: integration with the auth module

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, PageResponse, RequestConfig};
pub use rate_limit::{Throttle, ThrottleConfig};
