//! Commit Coordinator
//!
//! Drives the batch commit boundary: the whole pending log goes to the backend
//! in one submission, and only a confirmed submission clears local state and
//! triggers a fresh read. Holding `&mut CatalogStaging` across the await keeps
//! every other mutation out while a commit is outstanding.

use super::error::CommitError;
use super::staging_service::CatalogStaging;
use crate::models::LabelRecord;
use crate::operations::Operation;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Reads the authoritative hierarchy from the backend
#[async_trait]
pub trait HierarchySource: Send + Sync {
    async fn load_hierarchy(&self) -> Result<Vec<LabelRecord>>;
}

/// Sends a batch of operations to the backend in staging order
///
/// An `Ok` return means the backend persisted the whole batch.
#[async_trait]
pub trait BatchSubmitter: Send + Sync {
    async fn submit_batch(&self, operations: &[Operation]) -> Result<()>;
}

/// Result of a successful commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// Operations sent in the batch
    pub submitted: usize,
    /// Labels in the reloaded hierarchy
    pub labels: usize,
}

pub struct CommitCoordinator {
    source: Arc<dyn HierarchySource>,
    submitter: Arc<dyn BatchSubmitter>,
}

impl CommitCoordinator {
    pub fn new(source: Arc<dyn HierarchySource>, submitter: Arc<dyn BatchSubmitter>) -> Self {
        Self { source, submitter }
    }

    /// Replace the hierarchy with a fresh read
    ///
    /// On failure the current hierarchy is kept.
    pub async fn load(&self, staging: &mut CatalogStaging) -> Result<usize, CommitError> {
        let labels = self
            .source
            .load_hierarchy()
            .await
            .map_err(|e| CommitError::load_failed(format!("{:#}", e)))?;
        let count = labels.len();
        staging.replace_all(labels);
        tracing::info!("Loaded hierarchy with {} label(s)", count);
        Ok(count)
    }

    /// Submit the pending log as one batch
    ///
    /// An empty log submits nothing. A failed submission leaves the log and
    /// the hierarchy exactly as they were.
    pub async fn commit(&self, staging: &mut CatalogStaging) -> Result<CommitReport, CommitError> {
        if !staging.has_pending_changes() {
            tracing::debug!("Nothing to commit");
            return Ok(CommitReport {
                submitted: 0,
                labels: staging.labels().len(),
            });
        }

        let submitted = staging.operations().len();
        tracing::info!("Submitting batch of {} operation(s)", submitted);

        let submission = self.submitter.submit_batch(staging.operations());
        let outcome = match staging.config().submit_timeout {
            Some(limit) => tokio::time::timeout(limit, submission)
                .await
                .map_err(|_| CommitError::TimedOut(limit))?,
            None => submission.await,
        };
        if let Err(e) = outcome {
            tracing::warn!("Batch submission failed: {:#}", e);
            return Err(CommitError::rejected(format!("{:#}", e)));
        }

        staging.clear_operations();
        staging.clear_statuses();

        match self.load(staging).await {
            Ok(labels) => Ok(CommitReport { submitted, labels }),
            Err(e) => {
                tracing::error!("Batch committed but reload failed: {}", e);
                Err(CommitError::reload_after_commit(submitted, e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LabelFields;
    use crate::operations::StagedChange;
    use std::sync::Mutex;

    struct FixedSource(Vec<LabelRecord>);

    #[async_trait]
    impl HierarchySource for FixedSource {
        async fn load_hierarchy(&self) -> Result<Vec<LabelRecord>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSubmitter {
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl BatchSubmitter for RecordingSubmitter {
        async fn submit_batch(&self, operations: &[Operation]) -> Result<()> {
            self.batches.lock().unwrap().push(operations.len());
            Ok(())
        }
    }

    #[test]
    fn test_empty_log_submits_nothing() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let coordinator = CommitCoordinator::new(Arc::new(FixedSource(Vec::new())), submitter.clone());
        let mut staging = CatalogStaging::new();

        let report = tokio_test::block_on(coordinator.commit(&mut staging)).unwrap();

        assert_eq!(report.submitted, 0);
        assert!(submitter.batches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_commit_submits_whole_log_once() {
        let reloaded = vec![LabelRecord::new(LabelFields {
            label_id: "L1".to_string(),
            ..Default::default()
        })];
        let submitter = Arc::new(RecordingSubmitter::default());
        let coordinator = CommitCoordinator::new(Arc::new(FixedSource(reloaded)), submitter.clone());

        let mut staging = CatalogStaging::new();
        for id in ["L1", "L2"] {
            staging.add_operation(StagedChange::create_label(LabelFields {
                label_id: id.to_string(),
                ..Default::default()
            }));
        }

        let report = tokio_test::block_on(coordinator.commit(&mut staging)).unwrap();

        assert_eq!(report, CommitReport { submitted: 2, labels: 1 });
        assert_eq!(*submitter.batches.lock().unwrap(), vec![2]);
        assert!(!staging.has_pending_changes());
        assert_eq!(staging.hierarchy().pending_count(), 0);
    }
}
