//! Offset cursor and pagination configuration
//!
//! The feed corpus paginates one way: an offset that advances by a fixed page
//! size until it reaches a total reported by the first response.

use crate::auth::extract_json_path;
use crate::types::{JsonValue, StringMap};

/// Tracks pagination progress for a run.
///
/// Invariants: `offset` only ever advances by `page_size`; `total` is learned
/// from the first response and never decreases afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Current record offset
    pub offset: u64,
    /// Fixed page size for the duration of the run
    pub page_size: u64,
    /// Total record count reported by the endpoint
    pub total: u64,
}

impl PageCursor {
    /// Create a cursor at offset zero with an unknown total
    pub fn new(page_size: u64) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    /// Record a reported total. Totals never decrease once observed.
    pub fn record_total(&mut self, total: u64) {
        self.total = self.total.max(total);
    }

    /// Advance the offset by one page
    pub fn advance(&mut self) {
        self.offset += self.page_size;
    }

    /// True once the offset has reached or passed the total
    pub fn is_done(&self) -> bool {
        self.offset >= self.total
    }
}

/// Pagination field names for an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPagination {
    /// Query parameter carrying the offset
    pub offset_param: String,
    /// Query parameter carrying the page size
    pub size_param: String,
    /// Records requested per page
    pub page_size: u64,
    /// JSON path to the total record count in the response
    pub total_path: String,
}

impl OffsetPagination {
    /// Create a pagination config
    pub fn new(
        offset_param: impl Into<String>,
        size_param: impl Into<String>,
        page_size: u64,
        total_path: impl Into<String>,
    ) -> Self {
        Self {
            offset_param: offset_param.into(),
            size_param: size_param.into(),
            page_size,
            total_path: total_path.into(),
        }
    }

    /// Create the cursor for a fresh run of this endpoint
    pub fn cursor(&self) -> PageCursor {
        PageCursor::new(self.page_size)
    }

    /// Query parameters for the page at the cursor's current offset
    pub fn page_params(&self, cursor: &PageCursor) -> StringMap {
        let mut params = StringMap::new();
        params.insert(self.offset_param.clone(), cursor.offset.to_string());
        params.insert(self.size_param.clone(), self.page_size.to_string());
        params
    }

    /// Extract the reported total from a response body
    pub fn extract_total(&self, body: &JsonValue) -> Option<u64> {
        extract_json_path(body, &self.total_path).and_then(|s| s.parse::<u64>().ok())
    }

    /// Process the first page: learn the total and decide whether to continue.
    ///
    /// Returns `true` when pagination is finished after this page. A first
    /// page shorter than the requested page size terminates the run
    /// regardless of the reported total, guarding against endpoints whose
    /// totals disagree with what they actually return.
    pub fn probe(&self, body: &JsonValue, first_count: usize, cursor: &mut PageCursor) -> bool {
        match self.extract_total(body) {
            Some(total) => cursor.record_total(total),
            // No usable total means we cannot issue further offsets
            None => return true,
        }

        if first_count < self.page_size as usize {
            return true;
        }

        cursor.advance();
        cursor.is_done()
    }
}
