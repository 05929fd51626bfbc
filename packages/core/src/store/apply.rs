//! Net-effect application
//!
//! Projects staged changes onto the hierarchy so the tree always shows what
//! the server will hold once the log is committed:
//!
//! - CREATE inserts a record tagged `PendingCreate`
//! - UPDATE shallow-applies field changes (`PendingUpdate`, except that a
//!   pending creation stays `PendingCreate`)
//! - DELETE only tags the record `PendingDelete`; it leaves the tree on reload
//!
//! Structural problems (missing target, missing owner, id collision) leave the
//! tree untouched and come back as a `StagingError`.

use super::hierarchy::HierarchyStore;
use crate::models::{LabelChanges, LabelFields, LabelRecord, RecordStatus, ValueChanges, ValueFields, ValueRecord};
use crate::operations::{Collection, Snapshot, StagedChange, StagingError};

fn mark_updated(status: &mut RecordStatus) {
    if *status != RecordStatus::PendingCreate {
        *status = RecordStatus::PendingUpdate;
    }
}

impl HierarchyStore {
    /// Apply the hierarchy effect of `change`
    pub(crate) fn apply(&mut self, change: &StagedChange) -> Result<(), StagingError> {
        match change {
            StagedChange::CreateLabel(fields) => self.insert_label(fields),
            StagedChange::CreateValue(fields) => self.insert_value(fields),
            StagedChange::UpdateLabel(update) => {
                self.update_label(&update.target_id, &update.field_changes)
            }
            StagedChange::UpdateValue(update) => self.update_value(
                update.parent_id.as_deref(),
                &update.target_id,
                &update.field_changes,
            ),
            StagedChange::DeleteLabel(delete) => {
                let label = self
                    .label_mut(&delete.target_id)
                    .ok_or_else(|| StagingError::label_not_found(&delete.target_id))?;
                label.status = RecordStatus::PendingDelete;
                Ok(())
            }
            StagedChange::DeleteValue(delete) => {
                let value = self
                    .value_mut(delete.parent_id.as_deref(), &delete.target_id)
                    .ok_or_else(|| StagingError::value_not_found(&delete.target_id))?;
                value.status = RecordStatus::PendingDelete;
                Ok(())
            }
        }
    }

    /// Check that a CREATE can be placed without touching the tree
    pub(crate) fn check_create(&self, change: &StagedChange) -> Result<(), StagingError> {
        match change {
            StagedChange::CreateLabel(fields) if self.label(&fields.label_id).is_some() => {
                Err(StagingError::duplicate_label_id(&fields.label_id))
            }
            StagedChange::CreateValue(fields) if self.contains_value(&fields.value_id) => {
                Err(StagingError::duplicate_value_id(&fields.value_id))
            }
            StagedChange::CreateValue(fields) if self.label(&fields.label_id).is_none() => Err(
                StagingError::parent_label_not_found(&fields.label_id, &fields.value_id),
            ),
            _ => Ok(()),
        }
    }

    /// Check that an UPDATE's rename, if any, does not collide with another record
    pub(crate) fn check_update(&self, change: &StagedChange) -> Result<(), StagingError> {
        match change {
            StagedChange::UpdateLabel(update) => match update.field_changes.renames(&update.target_id) {
                Some(new_id) if self.label(new_id).is_some() => {
                    Err(StagingError::duplicate_label_id(new_id))
                }
                _ => Ok(()),
            },
            StagedChange::UpdateValue(update) => match update.field_changes.renames(&update.target_id) {
                Some(new_id) if self.contains_value(new_id) => {
                    Err(StagingError::duplicate_value_id(new_id))
                }
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn insert_label(&mut self, fields: &LabelFields) -> Result<(), StagingError> {
        if self.label(&fields.label_id).is_some() {
            return Err(StagingError::duplicate_label_id(&fields.label_id));
        }
        let mut label = LabelRecord::new(fields.clone());
        label.status = RecordStatus::PendingCreate;
        self.push_label(label);
        Ok(())
    }

    fn insert_value(&mut self, fields: &ValueFields) -> Result<(), StagingError> {
        if self.contains_value(&fields.value_id) {
            return Err(StagingError::duplicate_value_id(&fields.value_id));
        }
        let owner = self
            .label_mut(&fields.label_id)
            .ok_or_else(|| StagingError::parent_label_not_found(&fields.label_id, &fields.value_id))?;

        let mut value = ValueRecord::new(fields.clone());
        value.inherited = owner.inherited();
        value.status = RecordStatus::PendingCreate;
        owner.values.push(value);
        Ok(())
    }

    fn update_label(&mut self, target_id: &str, changes: &LabelChanges) -> Result<(), StagingError> {
        if let Some(new_id) = changes.renames(target_id) {
            if self.label(new_id).is_some() {
                return Err(StagingError::duplicate_label_id(new_id));
            }
        }

        let label = self
            .label_mut(target_id)
            .ok_or_else(|| StagingError::label_not_found(target_id))?;
        changes.apply_to(&mut label.fields);
        mark_updated(&mut label.status);

        let renamed = label.propagate_to_values();
        if renamed > 0 {
            tracing::debug!(
                "Label '{}' renamed to '{}', {} value(s) follow",
                target_id,
                label.id(),
                renamed
            );
        }
        Ok(())
    }

    fn update_value(
        &mut self,
        parent_hint: Option<&str>,
        target_id: &str,
        changes: &ValueChanges,
    ) -> Result<(), StagingError> {
        if let Some(new_id) = changes.renames(target_id) {
            if self.contains_value(new_id) {
                return Err(StagingError::duplicate_value_id(new_id));
            }
        }

        let value = self
            .value_mut(parent_hint, target_id)
            .ok_or_else(|| StagingError::value_not_found(target_id))?;
        changes.apply_to(&mut value.fields);
        mark_updated(&mut value.status);
        Ok(())
    }

    /// Capture the attributes `change` is about to overwrite
    ///
    /// `None` for CREATE (nothing to restore) and when the target is absent.
    pub(crate) fn snapshot(&self, change: &StagedChange) -> Option<Snapshot> {
        match change {
            StagedChange::UpdateLabel(_) | StagedChange::DeleteLabel(_) => self
                .label(change.target_id())
                .map(|label| Snapshot::Label(label.fields.clone())),
            StagedChange::UpdateValue(_) | StagedChange::DeleteValue(_) => self
                .value(change.parent_hint(), change.target_id())
                .map(|value| Snapshot::Value(value.fields.clone())),
            StagedChange::CreateLabel(_) | StagedChange::CreateValue(_) => None,
        }
    }

    /// Overwrite the record currently identified by `current_id` with `snapshot`
    ///
    /// Clears the record's status. A restored label re-propagates to its
    /// values, so a reverted rename cascades back. A restored value keeps its
    /// current owner.
    pub(crate) fn restore(
        &mut self,
        current_id: &str,
        parent_hint: Option<&str>,
        snapshot: &Snapshot,
    ) -> Result<(), StagingError> {
        match snapshot {
            Snapshot::Label(fields) => {
                if fields.label_id != current_id && self.label(&fields.label_id).is_some() {
                    return Err(StagingError::duplicate_label_id(&fields.label_id));
                }
                let label = self
                    .label_mut(current_id)
                    .ok_or_else(|| StagingError::label_not_found(current_id))?;
                label.fields = fields.clone();
                label.status = RecordStatus::None;
                label.propagate_to_values();
                Ok(())
            }
            Snapshot::Value(fields) => {
                if fields.value_id != current_id && self.contains_value(&fields.value_id) {
                    return Err(StagingError::duplicate_value_id(&fields.value_id));
                }
                let value = self
                    .value_mut(parent_hint, current_id)
                    .ok_or_else(|| StagingError::value_not_found(current_id))?;
                let owner = std::mem::take(&mut value.fields.label_id);
                value.fields = fields.clone();
                value.fields.label_id = owner;
                value.status = RecordStatus::None;
                Ok(())
            }
        }
    }

    /// Remove the record a pending CREATE inserted
    pub(crate) fn discard_created(&mut self, change: &StagedChange) -> Result<(), StagingError> {
        let id = change.current_id();
        let removed = match change.collection() {
            Collection::Labels => self.remove_label(id).is_some(),
            Collection::Values => self.remove_value(change.parent_hint(), id).is_some(),
        };

        if removed {
            Ok(())
        } else {
            match change.collection() {
                Collection::Labels => Err(StagingError::label_not_found(id)),
                Collection::Values => Err(StagingError::value_not_found(id)),
            }
        }
    }
}
