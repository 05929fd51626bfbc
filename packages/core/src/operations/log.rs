//! Pending operation log
//!
//! Ordered list of staged intents that have not been sent to the backend yet.
//! The log itself has no merge policy: `CatalogStaging` decides what to push,
//! merge or cancel, and uses the lookups here to find the related entry.

use super::payload::{Action, Collection, StagedChange};
use crate::models::{LabelFields, ValueFields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Deep copy of a record's attributes taken when an UPDATE/DELETE is staged
///
/// Used exclusively to revert the record on undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Snapshot {
    // Values first: a value snapshot always carries `IDVALOR`, a label one never does
    Value(ValueFields),
    Label(LabelFields),
}

/// A staged operation as recorded in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Log-local id, distinct from the target record's id
    pub id: String,

    #[serde(flatten)]
    pub change: StagedChange,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_snapshot: Option<Snapshot>,

    pub staged_at: DateTime<Utc>,
}

impl Operation {
    pub fn new(change: StagedChange, original_snapshot: Option<Snapshot>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            change,
            original_snapshot,
            staged_at: Utc::now(),
        }
    }

    pub fn collection(&self) -> Collection {
        self.change.collection()
    }

    pub fn action(&self) -> Action {
        self.change.action()
    }

    fn matches(&self, collection: Collection, current_id: &str, action: Action) -> bool {
        self.collection() == collection
            && self.action() == action
            && self.change.current_id() == current_id
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperationLog {
    entries: Vec<Operation>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Operation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, operation_id: &str) -> Option<&Operation> {
        self.entries.iter().find(|op| op.id == operation_id)
    }

    pub fn push(&mut self, operation: Operation) {
        self.entries.push(operation);
    }

    pub fn remove(&mut self, operation_id: &str) -> Option<Operation> {
        let position = self.entries.iter().position(|op| op.id == operation_id)?;
        Some(self.entries.remove(position))
    }

    /// Empty the log, returning how many entries were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    /// Pending entry with `action` whose record currently has `current_id`
    pub fn pending_mut(
        &mut self,
        collection: Collection,
        current_id: &str,
        action: Action,
    ) -> Option<&mut Operation> {
        self.entries
            .iter_mut()
            .find(|op| op.matches(collection, current_id, action))
    }

    pub fn pending(&self, collection: Collection, current_id: &str, action: Action) -> Option<&Operation> {
        self.entries
            .iter()
            .find(|op| op.matches(collection, current_id, action))
    }

    pub fn has_pending(&self, collection: Collection, current_id: &str, action: Action) -> bool {
        self.pending(collection, current_id, action).is_some()
    }

    /// Remove and return the pending entry with `action` for the record
    pub fn take_pending(
        &mut self,
        collection: Collection,
        current_id: &str,
        action: Action,
    ) -> Option<Operation> {
        let position = self
            .entries
            .iter()
            .position(|op| op.matches(collection, current_id, action))?;
        Some(self.entries.remove(position))
    }

    /// Remove every value operation staged under `label_id`
    pub fn drop_values_under(&mut self, label_id: &str) -> Vec<Operation> {
        let (dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|op| {
                op.collection() == Collection::Values && op.change.parent_hint() == Some(label_id)
            });
        self.entries = kept;
        dropped
    }

    /// Point value operations staged under label `from` at label `to`
    ///
    /// Returns how many entries were rewritten.
    pub fn retarget_value_parents(&mut self, from: &str, to: &str) -> usize {
        let mut rewritten = 0;
        for op in &mut self.entries {
            let parent = match &mut op.change {
                StagedChange::CreateValue(fields) => Some(&mut fields.label_id),
                StagedChange::UpdateValue(update) => update.parent_id.as_mut(),
                StagedChange::DeleteValue(delete) => delete.parent_id.as_mut(),
                _ => None,
            };
            if let Some(parent) = parent.filter(|p| p.as_str() == from) {
                *parent = to.to_string();
                rewritten += 1;
            }
        }
        rewritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabelChanges, ValueChanges};
    use serde_json::json;

    fn value_create(id: &str, owner: &str) -> StagedChange {
        StagedChange::create_value(ValueFields {
            value_id: id.to_string(),
            label_id: owner.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_pending_lookup_uses_current_id() {
        let mut log = OperationLog::new();
        log.push(Operation::new(
            StagedChange::update_label("A", LabelChanges::new().with_label_id("B")),
            None,
        ));

        assert!(log.has_pending(Collection::Labels, "B", Action::Update));
        assert!(!log.has_pending(Collection::Labels, "A", Action::Update));
        assert!(!log.has_pending(Collection::Values, "B", Action::Update));
    }

    #[test]
    fn test_take_pending_removes_entry() {
        let mut log = OperationLog::new();
        log.push(Operation::new(StagedChange::delete_label("L1"), None));
        log.push(Operation::new(StagedChange::delete_label("L2"), None));

        let taken = log.take_pending(Collection::Labels, "L1", Action::Delete);

        assert_eq!(taken.map(|op| op.change.target_id().to_string()), Some("L1".to_string()));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].change.target_id(), "L2");
    }

    #[test]
    fn test_drop_values_under_keeps_order_of_survivors() {
        let mut log = OperationLog::new();
        log.push(Operation::new(value_create("V1", "L1"), None));
        log.push(Operation::new(StagedChange::delete_label("L0"), None));
        log.push(Operation::new(value_create("V2", "L2"), None));
        log.push(Operation::new(
            StagedChange::update_value("V3", Some("L1".to_string()), ValueChanges::new()),
            None,
        ));

        let dropped = log.drop_values_under("L1");

        assert_eq!(dropped.len(), 2);
        let remaining: Vec<_> = log.entries().iter().map(|op| op.change.target_id()).collect();
        assert_eq!(remaining, vec!["L0", "V2"]);
    }

    #[test]
    fn test_retarget_value_parents() {
        let mut log = OperationLog::new();
        log.push(Operation::new(value_create("V1", "OLD"), None));
        log.push(Operation::new(value_create("V2", "OTHER"), None));
        log.push(Operation::new(
            StagedChange::delete_value("V3", Some("OLD".to_string())),
            None,
        ));

        assert_eq!(log.retarget_value_parents("OLD", "NEW"), 2);
        assert_eq!(log.entries()[0].change.parent_hint(), Some("NEW"));
        assert_eq!(log.entries()[1].change.parent_hint(), Some("OTHER"));
        assert_eq!(log.entries()[2].change.parent_hint(), Some("NEW"));
    }

    #[test]
    fn test_operation_wire_format() {
        let op = Operation::new(
            StagedChange::delete_value("V1", Some("L1".to_string())),
            Some(Snapshot::Value(ValueFields {
                value_id: "V1".to_string(),
                label_id: "L1".to_string(),
                ..Default::default()
            })),
        );

        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["id"], op.id.as_str());
        assert_eq!(json["collection"], "values");
        assert_eq!(json["action"], "DELETE");
        assert_eq!(json["payload"], json!({ "targetId": "V1", "parentId": "L1" }));
        assert_eq!(json["originalSnapshot"]["IDVALOR"], "V1");
        assert!(json.get("stagedAt").is_some());

        let back: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn test_label_snapshot_deserializes_as_label() {
        let snapshot: Snapshot =
            serde_json::from_value(json!({ "IDETIQUETA": "L1", "ETIQUETA": "One" })).unwrap();
        assert!(matches!(snapshot, Snapshot::Label(_)));
    }
}
