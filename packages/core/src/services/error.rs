//! Service Layer Error Types
//!
//! Failures at the commit boundary, where the staging layer meets the backend.
//! Staging itself never fails: its diagnostics travel inside the outcomes.

use std::time::Duration;
use thiserror::Error;

/// Commit and load errors
#[derive(Error, Debug)]
pub enum CommitError {
    /// The backend refused the batch; the log and hierarchy are untouched
    #[error("Batch rejected: {0}")]
    Rejected(String),

    /// The batch submission did not finish in time; the log is untouched
    #[error("Batch submission timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// Reading the hierarchy failed; the current hierarchy is kept
    #[error("Failed to load hierarchy: {0}")]
    LoadFailed(String),

    /// The batch was persisted but the fresh read failed
    ///
    /// The log has already been cleared, so the batch must not be resent.
    #[error("Committed {submitted} operation(s) but reload failed: {context}")]
    ReloadAfterCommit { submitted: usize, context: String },
}

impl CommitError {
    /// Create a rejected batch error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create a load failed error
    pub fn load_failed(msg: impl Into<String>) -> Self {
        Self::LoadFailed(msg.into())
    }

    /// Create a reload-after-commit error
    pub fn reload_after_commit(submitted: usize, context: impl Into<String>) -> Self {
        Self::ReloadAfterCommit {
            submitted,
            context: context.into(),
        }
    }

    /// Whether the batch reached the backend
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::ReloadAfterCommit { .. })
    }
}
