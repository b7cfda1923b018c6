// src/bundler/driver.rs

//! Runs one planned build against the bundler.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::bundler::Bundler;
use crate::bundler::aggregate::{loader_trailer, write_aggregate};
use crate::engine::{BuildOutcome, BuildPlan};
use crate::fs::FileSystem;

/// Execute `plan` and report how it went.
///
/// For a test build this also regenerates the import aggregate beforehand
/// (when stale or missing), and afterwards appends the loader trailer to the
/// bundle and deletes the aggregate source. Any failure along the way is a
/// failed build, never an error for the caller.
pub async fn run_build<B>(bundler: &B, fs: Arc<dyn FileSystem>, plan: &BuildPlan) -> BuildOutcome
where
    B: Bundler + ?Sized,
{
    match run_build_inner(bundler, fs, plan).await {
        Ok(()) => BuildOutcome::Success,
        Err(err) => BuildOutcome::Failed(format!("{err:#}")),
    }
}

async fn run_build_inner<B>(bundler: &B, fs: Arc<dyn FileSystem>, plan: &BuildPlan) -> Result<()>
where
    B: Bundler + ?Sized,
{
    if let Some(aggregate) = &plan.aggregate {
        if aggregate.regenerate || !fs.exists(&aggregate.entry) {
            // Listing test files walks the tree with blocking IO.
            let fs = Arc::clone(&fs);
            let aggregate = aggregate.clone();
            tokio::task::spawn_blocking(move || write_aggregate(fs.as_ref(), &aggregate))
                .await
                .context("test aggregate task failed")??;
        }
    }

    bundler.bundle(plan.job.clone()).await?;

    if let Some(aggregate) = &plan.aggregate {
        fs.append(
            &plan.job.output,
            loader_trailer(&aggregate.loader_module).as_bytes(),
        )
        .with_context(|| format!("appending loader trailer to {:?}", plan.job.output))?;

        if let Err(err) = fs.remove_file(&aggregate.entry) {
            warn!(entry = ?aggregate.entry, error = %err, "failed to remove test aggregate");
        } else {
            debug!(entry = ?aggregate.entry, "removed test aggregate");
        }
    }

    Ok(())
}
