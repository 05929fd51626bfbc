//! Error types for the staging layer
//!
//! None of these are ever raised into the UI: they are carried inside
//! `StageOutcome` / `UndoOutcome` so callers can surface a diagnostic while the
//! store stays consistent.

use thiserror::Error;

/// Diagnostics produced while staging or undoing an operation
///
/// # Examples
///
/// ```rust
/// use catalog_core::operations::StagingError;
///
/// let err = StagingError::label_not_found("COLORS");
/// assert_eq!(err.to_string(), "Label 'COLORS' does not exist");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StagingError {
    /// Referenced label is absent from the hierarchy
    #[error("Label '{label_id}' does not exist")]
    LabelNotFound { label_id: String },

    /// Referenced value is absent from the hierarchy
    #[error("Value '{value_id}' does not exist")]
    ValueNotFound { value_id: String },

    /// A value creation names an owning label that is absent from the hierarchy
    #[error("Cannot place value '{value_id}': owning label '{label_id}' does not exist")]
    ParentLabelNotFound { label_id: String, value_id: String },

    /// A label creation or rename collides with an existing label id
    #[error("Label id '{label_id}' is already in use")]
    DuplicateLabelId { label_id: String },

    /// A value creation or rename collides with an existing value id
    #[error("Value id '{value_id}' is already in use")]
    DuplicateValueId { value_id: String },

    /// Undo requested for an update/delete that carries no snapshot
    ///
    /// Reverting without a snapshot would have to guess the prior state, so
    /// the revert is refused.
    #[error("Operation '{operation_id}' has no original snapshot; refusing to revert")]
    MissingSnapshot { operation_id: String },

    /// No pending operation with this id
    #[error("Operation '{operation_id}' is not pending")]
    OperationNotFound { operation_id: String },

    /// Wire payload does not match its collection/action pair
    #[error("Malformed operation payload: {0}")]
    MalformedPayload(String),
}

impl StagingError {
    pub fn label_not_found(label_id: impl Into<String>) -> Self {
        Self::LabelNotFound {
            label_id: label_id.into(),
        }
    }

    pub fn value_not_found(value_id: impl Into<String>) -> Self {
        Self::ValueNotFound {
            value_id: value_id.into(),
        }
    }

    pub fn parent_label_not_found(label_id: impl Into<String>, value_id: impl Into<String>) -> Self {
        Self::ParentLabelNotFound {
            label_id: label_id.into(),
            value_id: value_id.into(),
        }
    }

    pub fn duplicate_label_id(label_id: impl Into<String>) -> Self {
        Self::DuplicateLabelId {
            label_id: label_id.into(),
        }
    }

    pub fn duplicate_value_id(value_id: impl Into<String>) -> Self {
        Self::DuplicateValueId {
            value_id: value_id.into(),
        }
    }

    pub fn missing_snapshot(operation_id: impl Into<String>) -> Self {
        Self::MissingSnapshot {
            operation_id: operation_id.into(),
        }
    }

    pub fn operation_not_found(operation_id: impl Into<String>) -> Self {
        Self::OperationNotFound {
            operation_id: operation_id.into(),
        }
    }

    pub fn malformed_payload(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// Whether the error comes from a missing or colliding hierarchy record
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::LabelNotFound { .. }
                | Self::ValueNotFound { .. }
                | Self::ParentLabelNotFound { .. }
                | Self::DuplicateLabelId { .. }
                | Self::DuplicateValueId { .. }
        )
    }
}
