//! Business Services
//!
//! - `CatalogStaging` - optimistic edit store: merge engine, undo, listeners
//! - `CommitCoordinator` - batch commit boundary and hierarchy (re)load
//!
//! Services coordinate the hierarchy store and the operation log, and are the
//! only place where the two are mutated together.

pub mod commit;
pub mod error;
pub mod staging_service;

pub use commit::{BatchSubmitter, CommitCoordinator, CommitReport, HierarchySource};
pub use error::CommitError;
pub use staging_service::{CatalogStaging, StageOutcome, UndoOutcome};
