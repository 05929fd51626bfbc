//! File-backed collaborators for offline replay
//!
//! `FileHierarchySource` reads the hierarchy from a JSON file in the backend's
//! field format. `FileBatchSubmitter` writes each submitted batch to a JSON
//! file, overwriting the previous one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use catalog_core::models::LabelRecord;
use catalog_core::operations::Operation;
use catalog_core::services::{BatchSubmitter, HierarchySource};
use std::path::PathBuf;

pub struct FileHierarchySource {
    path: PathBuf,
}

impl FileHierarchySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HierarchySource for FileHierarchySource {
    async fn load_hierarchy(&self) -> Result<Vec<LabelRecord>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read hierarchy from {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid hierarchy JSON in {}", self.path.display()))
    }
}

pub struct FileBatchSubmitter {
    path: PathBuf,
}

impl FileBatchSubmitter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BatchSubmitter for FileBatchSubmitter {
    async fn submit_batch(&self, operations: &[Operation]) -> Result<()> {
        let body = serde_json::to_string_pretty(operations)?;
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("Failed to write batch to {}", self.path.display()))?;
        tracing::info!(
            "Wrote batch of {} operation(s) to {}",
            operations.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::models::LabelFields;
    use catalog_core::operations::StagedChange;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_source_reads_backend_format() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("hierarchy.json");
        tokio::fs::write(
            &path,
            r#"[{"IDETIQUETA":"SIZE","ETIQUETA":"Size","values":[{"IDVALOR":"M","VALOR":"Medium"}]}]"#,
        )
        .await?;

        let labels = FileHierarchySource::new(&path).load_hierarchy().await?;

        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].values[0].id(), "M");
        Ok(())
    }

    #[tokio::test]
    async fn test_source_reports_missing_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let result = FileHierarchySource::new(temp_dir.path().join("absent.json"))
            .load_hierarchy()
            .await;

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to read hierarchy"));
        Ok(())
    }

    #[tokio::test]
    async fn test_submitter_writes_batch() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("batch.json");
        let batch = vec![Operation::new(
            StagedChange::create_label(LabelFields {
                label_id: "NEW".to_string(),
                ..Default::default()
            }),
            None,
        )];

        FileBatchSubmitter::new(&path).submit_batch(&batch).await?;

        let written: Vec<Operation> = serde_json::from_str(&tokio::fs::read_to_string(&path).await?)?;
        assert_eq!(written, batch);
        Ok(())
    }
}
