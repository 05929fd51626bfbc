//! Staged Operations
//!
//! Types describing what the user asked for and what is waiting to be sent:
//!
//! - [`StagedChange`] - CREATE / UPDATE / DELETE on labels or values
//! - [`Operation`] - a staged change recorded in the log, with its undo snapshot
//! - [`OperationLog`] - ordered pending operations
//! - [`StagingError`] - diagnostics reported by the staging layer

pub mod error;
mod log;
mod payload;

pub use error::StagingError;
pub use log::{Operation, OperationLog, Snapshot};
pub use payload::{Action, Collection, DeletePayload, StagedChange, UpdatePayload};
