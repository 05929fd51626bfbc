//! Hierarchy Store
//!
//! Holds the current, optimistically edited label/value tree and broadcasts
//! change notifications. Mutation helpers used by the staging layer do not
//! notify on their own: the public entry point that drives them notifies once
//! when it is done, so listeners see one notification per logical change.

use super::listeners::{ListenerRegistry, Subscription};
use crate::models::{LabelRecord, ValueRecord};

#[derive(Default)]
pub struct HierarchyStore {
    labels: Vec<LabelRecord>,
    listeners: ListenerRegistry,
}

impl HierarchyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `labels`, without notifying anyone
    pub fn with_labels(labels: Vec<LabelRecord>) -> Self {
        let mut store = Self::new();
        store.labels = normalize(labels);
        store
    }

    /// Current tree
    pub fn labels(&self) -> &[LabelRecord] {
        &self.labels
    }

    /// Replace the whole tree (fresh server read) and notify
    pub fn replace_all(&mut self, labels: Vec<LabelRecord>) {
        self.labels = normalize(labels);
        tracing::debug!("Hierarchy replaced with {} labels", self.labels.len());
        self.notify();
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn notify(&self) {
        self.listeners.notify();
    }

    pub fn label(&self, label_id: &str) -> Option<&LabelRecord> {
        self.labels.iter().find(|l| l.id() == label_id)
    }

    pub(crate) fn label_mut(&mut self, label_id: &str) -> Option<&mut LabelRecord> {
        self.labels.iter_mut().find(|l| l.id() == label_id)
    }

    /// Find a value, looking under `parent_hint` first and then across all labels
    pub fn value(&self, parent_hint: Option<&str>, value_id: &str) -> Option<&ValueRecord> {
        let (label, value) = self.value_position(parent_hint, value_id)?;
        Some(&self.labels[label].values[value])
    }

    pub(crate) fn value_mut(
        &mut self,
        parent_hint: Option<&str>,
        value_id: &str,
    ) -> Option<&mut ValueRecord> {
        let (label, value) = self.value_position(parent_hint, value_id)?;
        Some(&mut self.labels[label].values[value])
    }

    pub fn contains_value(&self, value_id: &str) -> bool {
        self.value_position(None, value_id).is_some()
    }

    /// (label index, value index) of a value
    pub(crate) fn value_position(
        &self,
        parent_hint: Option<&str>,
        value_id: &str,
    ) -> Option<(usize, usize)> {
        let hinted = parent_hint.and_then(|hint| {
            let label = self.labels.iter().position(|l| l.id() == hint)?;
            let value = self.labels[label]
                .values
                .iter()
                .position(|v| v.id() == value_id)?;
            Some((label, value))
        });

        // Value ids are unique across labels, so a full scan is unambiguous
        hinted.or_else(|| {
            self.labels.iter().enumerate().find_map(|(label, record)| {
                record
                    .values
                    .iter()
                    .position(|v| v.id() == value_id)
                    .map(|value| (label, value))
            })
        })
    }

    pub(crate) fn push_label(&mut self, label: LabelRecord) {
        self.labels.push(label);
    }

    pub(crate) fn remove_label(&mut self, label_id: &str) -> Option<LabelRecord> {
        let position = self.labels.iter().position(|l| l.id() == label_id)?;
        Some(self.labels.remove(position))
    }

    pub(crate) fn remove_value(
        &mut self,
        parent_hint: Option<&str>,
        value_id: &str,
    ) -> Option<ValueRecord> {
        let (label, value) = self.value_position(parent_hint, value_id)?;
        Some(self.labels[label].values.remove(value))
    }

    /// Strip every status tag; returns how many records were tagged
    pub(crate) fn clear_statuses(&mut self) -> usize {
        let cleared = self.pending_count();
        for label in &mut self.labels {
            label.clear_statuses();
        }
        cleared
    }

    /// Number of labels and values carrying a non-default status
    pub fn pending_count(&self) -> usize {
        self.labels
            .iter()
            .map(|label| {
                usize::from(label.status.is_pending())
                    + label.values.iter().filter(|v| v.status.is_pending()).count()
            })
            .sum()
    }
}

fn normalize(mut labels: Vec<LabelRecord>) -> Vec<LabelRecord> {
    for label in &mut labels {
        label.propagate_to_values();
    }
    labels
}
