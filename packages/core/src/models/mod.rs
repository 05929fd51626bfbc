//! Data Models
//!
//! This module contains the catalog data structures the staging core operates on:
//!
//! - `LabelRecord` - Parent record ("etiqueta") owning a set of values
//! - `ValueRecord` - Child record ("valor") owned by exactly one label
//! - `LabelChanges` / `ValueChanges` - Partial updates with per-field shallow merge
//!
//! Attribute structs serialize with the backend's upper-case field names so a
//! staged operation can be sent to the server as-is.

mod changes;
mod record;

pub use changes::{LabelChanges, ValueChanges};
pub use record::{
    InheritedFields, LabelFields, LabelRecord, RecordStatus, ValueFields, ValueRecord,
};
