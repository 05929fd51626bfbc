//! Staged change payloads
//!
//! A staged change is one of six shapes: CREATE / UPDATE / DELETE on either
//! the `labels` or the `values` collection. Modelling the pair as a single enum
//! keeps the collection and the payload shape from ever disagreeing.
//!
//! On the wire a change is the flat triple the backend batch endpoint expects:
//!
//! ```json
//! { "collection": "values", "action": "UPDATE",
//!   "payload": { "targetId": "V1", "parentId": "L1", "fieldChanges": { "ALIAS": "a" } } }
//! ```

use super::error::StagingError;
use crate::models::{LabelChanges, LabelFields, ValueChanges, ValueFields};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Which half of the hierarchy an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Labels,
    Values,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Labels => "labels",
            Collection::Values => "values",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "CREATE",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UPDATE payload: which record, where to find it, and what changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload<C> {
    pub target_id: String,

    /// Owning label of a value, used as a lookup hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    pub field_changes: C,
}

/// DELETE payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePayload {
    pub target_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// A change the UI asks the staging layer to record
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireChange")]
pub enum StagedChange {
    CreateLabel(LabelFields),
    CreateValue(ValueFields),
    UpdateLabel(UpdatePayload<LabelChanges>),
    UpdateValue(UpdatePayload<ValueChanges>),
    DeleteLabel(DeletePayload),
    DeleteValue(DeletePayload),
}

impl StagedChange {
    pub fn create_label(fields: LabelFields) -> Self {
        Self::CreateLabel(fields)
    }

    pub fn create_value(fields: ValueFields) -> Self {
        Self::CreateValue(fields)
    }

    pub fn update_label(target_id: impl Into<String>, field_changes: LabelChanges) -> Self {
        Self::UpdateLabel(UpdatePayload {
            target_id: target_id.into(),
            parent_id: None,
            field_changes,
        })
    }

    pub fn update_value(
        target_id: impl Into<String>,
        parent_id: Option<String>,
        field_changes: ValueChanges,
    ) -> Self {
        Self::UpdateValue(UpdatePayload {
            target_id: target_id.into(),
            parent_id,
            field_changes,
        })
    }

    pub fn delete_label(target_id: impl Into<String>) -> Self {
        Self::DeleteLabel(DeletePayload {
            target_id: target_id.into(),
            parent_id: None,
        })
    }

    pub fn delete_value(target_id: impl Into<String>, parent_id: Option<String>) -> Self {
        Self::DeleteValue(DeletePayload {
            target_id: target_id.into(),
            parent_id,
        })
    }

    pub fn collection(&self) -> Collection {
        match self {
            Self::CreateLabel(_) | Self::UpdateLabel(_) | Self::DeleteLabel(_) => {
                Collection::Labels
            }
            Self::CreateValue(_) | Self::UpdateValue(_) | Self::DeleteValue(_) => {
                Collection::Values
            }
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Self::CreateLabel(_) | Self::CreateValue(_) => Action::Create,
            Self::UpdateLabel(_) | Self::UpdateValue(_) => Action::Update,
            Self::DeleteLabel(_) | Self::DeleteValue(_) => Action::Delete,
        }
    }

    /// Id of the record this change was staged against
    pub fn target_id(&self) -> &str {
        match self {
            Self::CreateLabel(fields) => &fields.label_id,
            Self::CreateValue(fields) => &fields.value_id,
            Self::UpdateLabel(update) => &update.target_id,
            Self::UpdateValue(update) => &update.target_id,
            Self::DeleteLabel(delete) | Self::DeleteValue(delete) => &delete.target_id,
        }
    }

    /// Id the record carries in the hierarchy once this change is applied
    ///
    /// Differs from [`Self::target_id`] only for an update that renames.
    pub fn current_id(&self) -> &str {
        match self {
            Self::UpdateLabel(update) => update
                .field_changes
                .renames(&update.target_id)
                .unwrap_or(update.target_id.as_str()),
            Self::UpdateValue(update) => update
                .field_changes
                .renames(&update.target_id)
                .unwrap_or(update.target_id.as_str()),
            _ => self.target_id(),
        }
    }

    /// Owning label of a value change, when known
    pub fn parent_hint(&self) -> Option<&str> {
        match self {
            Self::CreateValue(fields) => Some(&fields.label_id),
            Self::UpdateValue(update) => update.parent_id.as_deref(),
            Self::DeleteValue(delete) => delete.parent_id.as_deref(),
            _ => None,
        }
    }

    /// Fold a newer UPDATE into this pending CREATE or UPDATE
    ///
    /// Field changes land in the creation payload itself, or shallow-merge
    /// into the pending update's changes. Hands `newer` back unchanged when
    /// the two do not combine.
    pub fn absorb(&mut self, newer: StagedChange) -> Result<(), StagedChange> {
        match (self, newer) {
            (Self::CreateLabel(fields), Self::UpdateLabel(update)) => {
                update.field_changes.apply_to(fields);
                Ok(())
            }
            (Self::CreateValue(fields), Self::UpdateValue(update)) => {
                update.field_changes.apply_to(fields);
                Ok(())
            }
            (Self::UpdateLabel(pending), Self::UpdateLabel(update)) => {
                pending.field_changes.merge(update.field_changes);
                Ok(())
            }
            (Self::UpdateValue(pending), Self::UpdateValue(update)) => {
                pending.field_changes.merge(update.field_changes);
                Ok(())
            }
            (_, newer) => Err(newer),
        }
    }
}

impl Serialize for StagedChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StagedChange", 3)?;
        state.serialize_field("collection", &self.collection())?;
        state.serialize_field("action", &self.action())?;
        match self {
            Self::CreateLabel(fields) => state.serialize_field("payload", fields)?,
            Self::CreateValue(fields) => state.serialize_field("payload", fields)?,
            Self::UpdateLabel(update) => state.serialize_field("payload", update)?,
            Self::UpdateValue(update) => state.serialize_field("payload", update)?,
            Self::DeleteLabel(delete) | Self::DeleteValue(delete) => {
                state.serialize_field("payload", delete)?
            }
        }
        state.end()
    }
}

/// Loosely typed wire form, checked against the collection/action pair
#[derive(Deserialize)]
struct WireChange {
    collection: Collection,
    action: Action,
    payload: serde_json::Value,
}

impl TryFrom<WireChange> for StagedChange {
    type Error = StagingError;

    fn try_from(wire: WireChange) -> Result<Self, Self::Error> {
        let WireChange {
            collection,
            action,
            payload,
        } = wire;

        let parsed = match (collection, action) {
            (Collection::Labels, Action::Create) => {
                serde_json::from_value(payload).map(Self::CreateLabel)
            }
            (Collection::Values, Action::Create) => {
                serde_json::from_value(payload).map(Self::CreateValue)
            }
            (Collection::Labels, Action::Update) => {
                serde_json::from_value(payload).map(Self::UpdateLabel)
            }
            (Collection::Values, Action::Update) => {
                serde_json::from_value(payload).map(Self::UpdateValue)
            }
            (Collection::Labels, Action::Delete) => {
                serde_json::from_value(payload).map(Self::DeleteLabel)
            }
            (Collection::Values, Action::Delete) => {
                serde_json::from_value(payload).map(Self::DeleteValue)
            }
        };

        parsed.map_err(|e| StagingError::malformed_payload(format!("{} {}: {}", action, collection, e)))
    }
}
