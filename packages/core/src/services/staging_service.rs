//! Catalog Staging Service
//!
//! Public surface the editing UI talks to. Owns the hierarchy and the pending
//! operation log, and keeps the two consistent: every staged change is folded
//! into the log (merged, cancelled or enqueued) and its net effect is projected
//! onto the hierarchy before listeners are notified.
//!
//! # Merge rules
//!
//! Evaluated in order for each new change against the pending entry on the
//! same record (collection + current id):
//!
//! 1. DELETE over a pending CREATE cancels both; the record disappears
//! 2. DELETE over a pending UPDATE discards the update (its edits are reverted)
//!    and enqueues the delete with the update's snapshot
//! 3. UPDATE over a pending DELETE discards the delete, then continues below
//! 4. UPDATE over a pending UPDATE shallow-merges into the existing entry
//! 5. UPDATE over a pending CREATE merges into the creation payload
//! 6. Anything else is enqueued; UPDATE/DELETE capture an undo snapshot first
//!
//! # Notifications
//!
//! Each public mutating call notifies listeners at most once. Listeners must
//! not call back into the store while being notified.
//!
//! # Examples
//!
//! ```rust
//! use catalog_core::models::{LabelChanges, LabelFields};
//! use catalog_core::operations::StagedChange;
//! use catalog_core::services::{CatalogStaging, StageOutcome};
//!
//! let mut staging = CatalogStaging::new();
//!
//! let created = staging.add_operation(StagedChange::create_label(LabelFields {
//!     label_id: "COLORS".to_string(),
//!     name: "Colors".to_string(),
//!     ..Default::default()
//! }));
//! assert!(matches!(created, StageOutcome::Enqueued { .. }));
//!
//! // Editing an unsent label edits the creation itself
//! let edited = staging.add_operation(StagedChange::update_label(
//!     "COLORS",
//!     LabelChanges::new().with_name("Colours"),
//! ));
//! assert!(matches!(edited, StageOutcome::MergedIntoCreate { .. }));
//! assert_eq!(staging.operations().len(), 1);
//! ```

use crate::config::{OrphanValuePolicy, StagingConfig};
use crate::models::LabelRecord;
use crate::operations::{
    Action, Collection, Operation, OperationLog, Snapshot, StagedChange, StagingError,
};
use crate::store::{HierarchyStore, Subscription};

/// What `add_operation` did with a change
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Recorded as a new log entry
    Enqueued {
        operation_id: String,
        /// Pending entry this one replaced (rules 2 and 3)
        superseded: Option<String>,
        /// Structural problem that left the hierarchy untouched
        diagnostic: Option<StagingError>,
    },
    /// Folded into a pending UPDATE
    MergedIntoUpdate {
        operation_id: String,
        diagnostic: Option<StagingError>,
    },
    /// Folded into a pending CREATE
    MergedIntoCreate {
        operation_id: String,
        diagnostic: Option<StagingError>,
    },
    /// A DELETE cancelled a pending CREATE; neither is in the log
    CancelledCreate {
        operation_id: String,
        /// Dependent value operations dropped with a cancelled label
        dropped: usize,
    },
    /// The record already has a pending DELETE
    AlreadyPending { operation_id: String },
    /// Nothing was staged
    Rejected(StagingError),
}

impl StageOutcome {
    /// Log entry that now represents the change, if any
    pub fn operation_id(&self) -> Option<&str> {
        match self {
            Self::Enqueued { operation_id, .. }
            | Self::MergedIntoUpdate { operation_id, .. }
            | Self::MergedIntoCreate { operation_id, .. }
            | Self::AlreadyPending { operation_id } => Some(operation_id),
            Self::CancelledCreate { .. } | Self::Rejected(_) => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&StagingError> {
        match self {
            Self::Enqueued { diagnostic, .. }
            | Self::MergedIntoUpdate { diagnostic, .. }
            | Self::MergedIntoCreate { diagnostic, .. } => diagnostic.as_ref(),
            Self::Rejected(err) => Some(err),
            Self::CancelledCreate { .. } | Self::AlreadyPending { .. } => None,
        }
    }

    /// Whether the log or hierarchy changed
    pub fn changed_state(&self) -> bool {
        !matches!(self, Self::AlreadyPending { .. } | Self::Rejected(_))
    }
}

/// What `remove_operation` did
#[derive(Debug, Clone, PartialEq)]
pub enum UndoOutcome {
    /// A pending CREATE was undone and its record removed
    Discarded {
        operation: Operation,
        dropped: usize,
    },
    /// The record was restored from the operation's snapshot
    Restored { operation: Operation },
    /// The operation left the log but the hierarchy could not be reverted
    Unrestorable {
        operation: Operation,
        reason: StagingError,
    },
    /// Restoring would collide with another record's id; nothing changed
    Conflict(StagingError),
    /// No pending operation with that id
    NotFound,
}

/// Optimistic edit store for the label/value catalog
#[derive(Default)]
pub struct CatalogStaging {
    hierarchy: HierarchyStore,
    log: OperationLog,
    config: StagingConfig,
}

impl CatalogStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StagingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Seed the store with an initial hierarchy (no notification)
    pub fn with_labels(mut self, labels: Vec<LabelRecord>) -> Self {
        self.hierarchy = HierarchyStore::with_labels(labels);
        self
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    pub fn hierarchy(&self) -> &HierarchyStore {
        &self.hierarchy
    }

    pub fn labels(&self) -> &[LabelRecord] {
        self.hierarchy.labels()
    }

    /// Replace the hierarchy with a fresh server read
    pub fn replace_all(&mut self, labels: Vec<LabelRecord>) {
        self.hierarchy.replace_all(labels);
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hierarchy.subscribe(listener)
    }

    /// Pending operations in staging order, ready for batch submission
    pub fn operations(&self) -> &[Operation] {
        self.log.entries()
    }

    pub fn operation(&self, operation_id: &str) -> Option<&Operation> {
        self.log.get(operation_id)
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.log.is_empty()
    }

    /// Empty the log (after a confirmed commit)
    pub fn clear_operations(&mut self) {
        let dropped = self.log.clear();
        tracing::info!("Cleared {} pending operation(s)", dropped);
        self.hierarchy.notify();
    }

    /// Strip every status tag from the hierarchy (after a confirmed commit)
    pub fn clear_statuses(&mut self) {
        let cleared = self.hierarchy.clear_statuses();
        tracing::debug!("Cleared status on {} record(s)", cleared);
        self.hierarchy.notify();
    }

    /// Stage a change: merge or cancel against the pending log, project the
    /// net effect onto the hierarchy, then notify listeners
    pub fn add_operation(&mut self, change: StagedChange) -> StageOutcome {
        tracing::debug!(
            "Staging {} on {} '{}'",
            change.action(),
            change.collection(),
            change.target_id()
        );

        let outcome = match change.action() {
            Action::Create => self.stage_create(change),
            Action::Update => self.stage_update(change),
            Action::Delete => self.stage_delete(change),
        };

        match &outcome {
            StageOutcome::Rejected(err) => tracing::warn!("Change rejected: {}", err),
            other => {
                if let Some(err) = other.diagnostic().filter(|err| err.is_structural()) {
                    tracing::warn!("Change staged without hierarchy effect: {}", err);
                }
            }
        }

        if outcome.changed_state() {
            self.hierarchy.notify();
        }
        outcome
    }

    fn stage_create(&mut self, change: StagedChange) -> StageOutcome {
        match self.hierarchy.check_create(&change) {
            Ok(()) => {}
            Err(err @ StagingError::ParentLabelNotFound { .. })
                if self.config.orphan_values == OrphanValuePolicy::Stage =>
            {
                let operation = Operation::new(change, None);
                let operation_id = operation.id.clone();
                self.log.push(operation);
                return StageOutcome::Enqueued {
                    operation_id,
                    superseded: None,
                    diagnostic: Some(err),
                };
            }
            Err(err) => return StageOutcome::Rejected(err),
        }

        let diagnostic = self.hierarchy.apply(&change).err();
        let operation = Operation::new(change, None);
        let operation_id = operation.id.clone();
        self.log.push(operation);

        StageOutcome::Enqueued {
            operation_id,
            superseded: None,
            diagnostic,
        }
    }

    fn stage_delete(&mut self, mut change: StagedChange) -> StageOutcome {
        let collection = change.collection();
        let target_id = change.target_id().to_string();

        // Rule 1: the record never reached the server
        if let Some(create) = self.log.take_pending(collection, &target_id, Action::Create) {
            if let Err(err) = self.hierarchy.discard_created(&create.change) {
                tracing::debug!("Cancelled creation had no hierarchy record: {}", err);
            }
            let dropped = self.drop_dependents(&create);
            tracing::debug!("DELETE cancelled pending CREATE {}", create.id);
            return StageOutcome::CancelledCreate {
                operation_id: create.id,
                dropped,
            };
        }

        if let Some(pending) = self.log.pending_mut(collection, &target_id, Action::Delete) {
            return StageOutcome::AlreadyPending {
                operation_id: pending.id.clone(),
            };
        }

        // Rule 2: the delete supersedes a pending update
        let superseded = self.log.pending(collection, &target_id, Action::Update).cloned();
        if let Some(update) = &superseded {
            if let Some(snapshot) = &update.original_snapshot {
                match self.revert(update, snapshot) {
                    Ok(()) => {}
                    // The pre-edit id now belongs to another record
                    Err(
                        err @ (StagingError::DuplicateLabelId { .. }
                        | StagingError::DuplicateValueId { .. }),
                    ) => return StageOutcome::Rejected(err),
                    Err(err) => {
                        tracing::warn!("Could not revert superseded update {}: {}", update.id, err)
                    }
                }
            }
            // The server still knows the record by the update's original id
            if let StagedChange::DeleteLabel(delete) | StagedChange::DeleteValue(delete) = &mut change {
                delete.target_id = update.change.target_id().to_string();
            }
            self.log.remove(&update.id);
        }
        let snapshot = match &superseded {
            Some(update) => update.original_snapshot.clone(),
            None => self.hierarchy.snapshot(&change),
        };

        let diagnostic = self.hierarchy.apply(&change).err();
        let operation = Operation::new(change, snapshot);
        let operation_id = operation.id.clone();
        self.log.push(operation);

        StageOutcome::Enqueued {
            operation_id,
            superseded: superseded.map(|update| update.id),
            diagnostic,
        }
    }

    fn stage_update(&mut self, change: StagedChange) -> StageOutcome {
        if let Err(err) = self.hierarchy.check_update(&change) {
            return StageOutcome::Rejected(err);
        }

        let collection = change.collection();
        let target_id = change.target_id().to_string();

        // Rule 3: an edit un-deletes
        let revived = self.log.take_pending(collection, &target_id, Action::Delete);

        // Rules 4 and 5
        let merge_into = [Action::Update, Action::Create]
            .into_iter()
            .find(|action| self.log.has_pending(collection, &target_id, *action));
        if let Some(action) = merge_into {
            if let Some(pending) = self.log.pending_mut(collection, &target_id, action) {
                if let Err(change) = pending.change.absorb(change.clone()) {
                    return StageOutcome::Rejected(StagingError::malformed_payload(format!(
                        "{} {} cannot merge into pending {}",
                        change.action(),
                        change.collection(),
                        action
                    )));
                }
                let operation_id = pending.id.clone();
                let new_id = pending.change.current_id().to_string();

                let diagnostic = self.hierarchy.apply(&change).err();
                self.follow_label_rename(collection, &target_id, &new_id);

                return match action {
                    Action::Create => StageOutcome::MergedIntoCreate {
                        operation_id,
                        diagnostic,
                    },
                    _ => StageOutcome::MergedIntoUpdate {
                        operation_id,
                        diagnostic,
                    },
                };
            }
        }

        // Rule 6
        let snapshot = match &revived {
            Some(delete) => delete.original_snapshot.clone(),
            None => self.hierarchy.snapshot(&change),
        };
        let diagnostic = self.hierarchy.apply(&change).err();
        let operation = Operation::new(change, snapshot);
        let operation_id = operation.id.clone();
        self.log.push(operation);

        StageOutcome::Enqueued {
            operation_id,
            superseded: revived.map(|delete| delete.id),
            diagnostic,
        }
    }

    /// Undo one pending operation and notify listeners
    pub fn remove_operation(&mut self, operation_id: &str) -> UndoOutcome {
        let Some(operation) = self.log.get(operation_id).cloned() else {
            tracing::warn!("{}", StagingError::operation_not_found(operation_id));
            return UndoOutcome::NotFound;
        };

        let outcome = match operation.action() {
            Action::Create => {
                if let Err(err) = self.hierarchy.discard_created(&operation.change) {
                    tracing::warn!("Undone creation had no hierarchy record: {}", err);
                }
                self.log.remove(operation_id);
                let dropped = self.drop_dependents(&operation);
                UndoOutcome::Discarded { operation, dropped }
            }
            Action::Update | Action::Delete => match &operation.original_snapshot {
                None => {
                    let reason = StagingError::missing_snapshot(operation_id);
                    tracing::error!("{}", reason);
                    self.log.remove(operation_id);
                    UndoOutcome::Unrestorable { operation, reason }
                }
                Some(snapshot) => match self.revert(&operation, snapshot) {
                    Ok(()) => {
                        self.log.remove(operation_id);
                        UndoOutcome::Restored { operation }
                    }
                    Err(
                        err @ (StagingError::DuplicateLabelId { .. }
                        | StagingError::DuplicateValueId { .. }),
                    ) => {
                        tracing::warn!("Undo of {} refused: {}", operation_id, err);
                        return UndoOutcome::Conflict(err);
                    }
                    Err(reason) => {
                        tracing::warn!("Undo of {} left hierarchy untouched: {}", operation_id, reason);
                        self.log.remove(operation_id);
                        UndoOutcome::Unrestorable { operation, reason }
                    }
                },
            },
        };

        self.hierarchy.notify();
        outcome
    }

    /// Restore the record `operation` edited from `snapshot`
    ///
    /// A label restored to another id takes the pending value operations
    /// staged under its current id along.
    fn revert(&mut self, operation: &Operation, snapshot: &Snapshot) -> Result<(), StagingError> {
        let current_id = operation.change.current_id();
        self.hierarchy
            .restore(current_id, operation.change.parent_hint(), snapshot)?;
        if let Snapshot::Label(fields) = snapshot {
            self.follow_label_rename(Collection::Labels, current_id, &fields.label_id);
        }
        Ok(())
    }

    /// Point value operations staged under label `from` at its new id `to`
    fn follow_label_rename(&mut self, collection: Collection, from: &str, to: &str) {
        if collection != Collection::Labels || from == to {
            return;
        }
        let retargeted = self.log.retarget_value_parents(from, to);
        if retargeted > 0 {
            tracing::debug!(
                "Label '{}' now '{}', {} value operation(s) follow",
                from,
                to,
                retargeted
            );
        }
    }

    /// Drop value operations that depended on a label creation that is gone
    fn drop_dependents(&mut self, create: &Operation) -> usize {
        if create.collection() != Collection::Labels {
            return 0;
        }
        let dropped = self.log.drop_values_under(create.change.current_id());
        if !dropped.is_empty() {
            tracing::debug!(
                "Dropped {} value operation(s) under discarded label '{}'",
                dropped.len(),
                create.change.current_id()
            );
        }
        dropped.len()
    }
}

#[cfg(test)]
#[path = "staging_service_test.rs"]
mod staging_service_test;
