//! Catalog Replay
//!
//! Replays a scripted editing session against a `CatalogStaging` loaded from a
//! hierarchy file, then prints the resulting pending log as JSON on stdout.
//! Progress goes to stderr so the output can be piped.
//!
//! # Usage
//!
//! ```bash
//! CATALOG_HIERARCHY=hierarchy.json CATALOG_SCRIPT=session.json \
//!     cargo run --bin catalog-replay > pending.json
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_HIERARCHY`: hierarchy JSON file (required, re-read after each commit)
//! - `CATALOG_SCRIPT`: replay script JSON file (required)
//! - `CATALOG_BATCH_OUT`: where `commit` steps write the batch (default: `batch.json`)
//! - `CATALOG_ORPHAN_VALUES` / `CATALOG_SUBMIT_TIMEOUT_MS`: staging configuration
//! - `RUST_LOG`: Logging level (e.g., "info", "catalog_core=debug")

use anyhow::{Context, Result};
use catalog_core::services::{CatalogStaging, CommitCoordinator};
use catalog_core::StagingConfig;
use catalog_dev_tools::file_backend::{FileBatchSubmitter, FileHierarchySource};
use catalog_dev_tools::replay::{ReplayStep, Replayer};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

fn required_path(var: &str) -> Result<PathBuf> {
    env::var(var)
        .map(PathBuf::from)
        .with_context(|| format!("{} must point to a JSON file", var))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let hierarchy_path = required_path("CATALOG_HIERARCHY")?;
    let script_path = required_path("CATALOG_SCRIPT")?;
    let batch_path = env::var("CATALOG_BATCH_OUT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("batch.json"));

    let raw_script = tokio::fs::read_to_string(&script_path)
        .await
        .with_context(|| format!("Failed to read script {}", script_path.display()))?;
    let script: Vec<ReplayStep> = serde_json::from_str(&raw_script)
        .with_context(|| format!("Invalid script {}", script_path.display()))?;

    let coordinator = CommitCoordinator::new(
        Arc::new(FileHierarchySource::new(hierarchy_path)),
        Arc::new(FileBatchSubmitter::new(batch_path)),
    );
    let mut staging = CatalogStaging::with_config(StagingConfig::from_env());

    eprintln!("📂 Loading hierarchy...");
    if let Err(e) = coordinator.load(&mut staging).await {
        eprintln!("❌ {}", e);
        return Err(e.into());
    }
    eprintln!("✅ {} label(s) loaded, replaying {} step(s)", staging.labels().len(), script.len());

    let reports = Replayer::new(&mut staging, &coordinator).run(script).await?;
    for report in &reports {
        eprintln!("   [{}] {}", report.index, report.summary);
    }

    eprintln!("📋 {} pending operation(s)", staging.operations().len());
    println!("{}", serde_json::to_string_pretty(staging.operations())?);
    Ok(())
}
