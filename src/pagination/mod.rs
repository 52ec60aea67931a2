//! Pagination module
//!
//! Offset-based pagination: request a fixed-size page, learn the total record
//! count from the first response, then advance the offset until it reaches
//! the total. Pages are fetched sequentially so the output preserves the
//! endpoint's record order.

mod cursor;

pub use cursor::{OffsetPagination, PageCursor};
