//! Engine types
//!
//! Run lifecycle states, statistics, and the completion envelope handed back
//! to the host.

use bytes::Bytes;

// ============================================================================
// Run State
// ============================================================================

/// Lifecycle state of a feed run.
///
/// States advance strictly forward; `Failed` is terminal and reachable from
/// any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Not started
    #[default]
    Idle,
    /// Checking required parameters and binding templates
    ValidatingParams,
    /// Establishing the session artifact
    Authenticating,
    /// Fetching run-scoped metadata (field dictionaries)
    Preparing,
    /// Fetching and transforming pages
    Paginating,
    /// Closing the output document
    Finalizing,
    /// Run finished successfully
    Done,
    /// Run failed
    Failed,
}

impl RunState {
    /// True for states no run leaves
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ValidatingParams => "validating_params",
            Self::Authenticating => "authenticating",
            Self::Preparing => "preparing",
            Self::Paginating => "paginating",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Run Stats
// ============================================================================

/// Statistics from a feed run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Records written to the output
    pub records_emitted: usize,
    /// Pages fetched from the endpoint
    pub pages_fetched: usize,
    /// Size of the final payload in bytes
    pub payload_bytes: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add emitted records
    pub fn add_records(&mut self, count: usize) {
        self.records_emitted += count;
    }

    /// Add a fetched page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }
}

// ============================================================================
// Output and Completion
// ============================================================================

/// The product of a successful run
#[derive(Debug, Clone)]
pub struct FeedOutput {
    /// The serialized document
    pub payload: Bytes,
    /// Value echoed back for the next run's context
    pub previous_run_context: Option<String>,
    /// Run statistics
    pub stats: RunStats,
}

/// The envelope handed to the host exactly once per run.
///
/// Every run resolves to exactly one of these. There is no partial-result
/// variant: a run that fails mid-pagination reports only the failure.
#[derive(Debug, Clone)]
pub enum FeedCompletion {
    /// The run produced a full document
    Success {
        /// The serialized document
        output: Bytes,
        /// Value echoed back for the next run's context
        previous_run_context: Option<String>,
        /// Run statistics
        stats: RunStats,
    },
    /// The run failed; no output is delivered
    Failure {
        /// Human-readable failure description
        message: String,
    },
}

impl FeedCompletion {
    /// True for the success variant
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The failure message, if any
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Failure { message } => Some(message),
            Self::Success { .. } => None,
        }
    }
}

impl From<FeedOutput> for FeedCompletion {
    fn from(output: FeedOutput) -> Self {
        Self::Success {
            output: output.payload,
            previous_run_context: output.previous_run_context,
            stats: output.stats,
        }
    }
}
