//! Script replay
//!
//! A script is a JSON array of steps applied in order to one `CatalogStaging`:
//!
//! ```json
//! [
//!   { "op": "stage", "change": { "collection": "labels", "action": "CREATE", "payload": { "IDETIQUETA": "NEW" } } },
//!   { "op": "undo", "target": 0 },
//!   { "op": "clearStatuses" },
//!   { "op": "clearOperations" },
//!   { "op": "commit" }
//! ]
//! ```
//!
//! `undo` names the index of an earlier `stage` step; the operation that step
//! produced (or merged into) is removed.

use anyhow::{anyhow, Result};
use catalog_core::operations::StagedChange;
use catalog_core::services::{CatalogStaging, CommitCoordinator};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ReplayStep {
    Stage { change: StagedChange },
    Undo { target: usize },
    ClearStatuses,
    ClearOperations,
    Commit,
}

/// One line of replay output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub index: usize,
    pub summary: String,
}

pub struct Replayer<'a> {
    staging: &'a mut CatalogStaging,
    coordinator: &'a CommitCoordinator,
    /// Operation id produced by each step, by step index
    produced: Vec<Option<String>>,
}

impl<'a> Replayer<'a> {
    pub fn new(staging: &'a mut CatalogStaging, coordinator: &'a CommitCoordinator) -> Self {
        Self {
            staging,
            coordinator,
            produced: Vec::new(),
        }
    }

    /// Apply every step in order
    ///
    /// A failed commit is reported and replay continues with the log intact.
    /// An `undo` that points at a step which staged nothing aborts the replay.
    pub async fn run(&mut self, steps: Vec<ReplayStep>) -> Result<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(steps.len());
        for step in steps {
            let index = self.produced.len();
            let (produced, summary) = self.apply(index, step).await?;
            tracing::debug!("step {}: {}", index, summary);
            self.produced.push(produced);
            reports.push(StepReport { index, summary });
        }
        Ok(reports)
    }

    async fn apply(&mut self, index: usize, step: ReplayStep) -> Result<(Option<String>, String)> {
        match step {
            ReplayStep::Stage { change } => {
                let label = format!("{} {} '{}'", change.action(), change.collection(), change.target_id());
                let outcome = self.staging.add_operation(change);
                let produced = outcome.operation_id().map(str::to_string);
                Ok((produced, format!("stage {} -> {:?}", label, outcome)))
            }
            ReplayStep::Undo { target } => {
                let operation_id = self
                    .produced
                    .get(target)
                    .cloned()
                    .flatten()
                    .ok_or_else(|| anyhow!("step {} undoes step {}, which staged nothing", index, target))?;
                let outcome = self.staging.remove_operation(&operation_id);
                Ok((None, format!("undo step {} -> {:?}", target, outcome)))
            }
            ReplayStep::ClearStatuses => {
                self.staging.clear_statuses();
                Ok((None, "clear statuses".to_string()))
            }
            ReplayStep::ClearOperations => {
                self.staging.clear_operations();
                Ok((None, "clear operations".to_string()))
            }
            ReplayStep::Commit => match self.coordinator.commit(&mut *self.staging).await {
                Ok(report) => Ok((
                    None,
                    format!(
                        "commit -> submitted {}, reloaded {} label(s)",
                        report.submitted, report.labels
                    ),
                )),
                Err(e) if e.is_committed() => Ok((None, format!("commit persisted, reload failed -> {}", e))),
                Err(e) => {
                    tracing::warn!("Commit failed during replay: {}", e);
                    Ok((None, format!("commit failed -> {}", e)))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_backend::{FileBatchSubmitter, FileHierarchySource};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn steps(value: serde_json::Value) -> Result<Vec<ReplayStep>> {
        Ok(serde_json::from_value(value)?)
    }

    async fn setup(temp_dir: &TempDir) -> Result<(CatalogStaging, CommitCoordinator)> {
        let hierarchy = temp_dir.path().join("hierarchy.json");
        tokio::fs::write(
            &hierarchy,
            json!([{ "IDETIQUETA": "SIZE", "ETIQUETA": "Size", "values": [] }]).to_string(),
        )
        .await?;
        let coordinator = CommitCoordinator::new(
            Arc::new(FileHierarchySource::new(hierarchy)),
            Arc::new(FileBatchSubmitter::new(temp_dir.path().join("batch.json"))),
        );
        let mut staging = CatalogStaging::new();
        coordinator.load(&mut staging).await?;
        Ok((staging, coordinator))
    }

    #[tokio::test]
    async fn test_stage_then_undo() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (mut staging, coordinator) = setup(&temp_dir).await?;

        let script = steps(json!([
            { "op": "stage", "change": {
                "collection": "labels", "action": "UPDATE",
                "payload": { "targetId": "SIZE", "fieldChanges": { "ETIQUETA": "Talla" } }
            }},
            { "op": "undo", "target": 0 }
        ]))?;

        let reports = Replayer::new(&mut staging, &coordinator).run(script).await?;

        assert_eq!(reports.len(), 2);
        assert!(!staging.has_pending_changes());
        assert_eq!(staging.labels()[0].fields.name, "Size");
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_writes_batch_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (mut staging, coordinator) = setup(&temp_dir).await?;

        let script = steps(json!([
            { "op": "stage", "change": {
                "collection": "values", "action": "CREATE",
                "payload": { "IDVALOR": "M", "IDETIQUETA": "SIZE", "VALOR": "Medium" }
            }},
            { "op": "commit" }
        ]))?;

        Replayer::new(&mut staging, &coordinator).run(script).await?;

        let batch: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(temp_dir.path().join("batch.json")).await?)?;
        assert_eq!(batch[0]["collection"], "values");
        assert_eq!(batch[0]["payload"]["IDVALOR"], "M");
        assert!(!staging.has_pending_changes());
        Ok(())
    }

    #[tokio::test]
    async fn test_undo_of_empty_step_aborts() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (mut staging, coordinator) = setup(&temp_dir).await?;

        let script = steps(json!([
            { "op": "clearStatuses" },
            { "op": "undo", "target": 0 }
        ]))?;

        let result = Replayer::new(&mut staging, &coordinator).run(script).await;

        assert!(result.is_err());
        Ok(())
    }
}
