//! Catalog Staging Core
//!
//! Client-side editing layer for a two-level product catalog: labels
//! ("etiquetas") that each own a list of values ("valores"). Edits are applied
//! optimistically to an in-memory hierarchy and recorded in a pending log that
//! is sent to the backend as a single batch.
//!
//! # Architecture
//!
//! - **Optimistic projection**: the hierarchy always shows the net effect of the log
//! - **Merge on stage**: related changes fold together so the log stays minimal
//! - **Snapshot undo**: every UPDATE/DELETE carries the state it overwrote
//! - **Batch commit**: nothing reaches the backend until an explicit commit
//!
//! # Modules
//!
//! - [`models`] - Label/value records and partial field changes
//! - [`operations`] - Staged changes, the operation log and staging errors
//! - [`store`] - Hierarchy store and change listeners
//! - [`services`] - Staging service and commit coordinator
//! - [`config`] - Staging configuration

pub mod config;
pub mod models;
pub mod operations;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use config::{OrphanValuePolicy, StagingConfig};
pub use models::*;
pub use operations::{Operation, StagedChange, StagingError};
pub use services::*;
