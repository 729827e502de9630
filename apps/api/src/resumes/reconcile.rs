//! Startup reconciliation between stored artifacts and resume records.
//!
//! Runs once before the server accepts requests, so nothing else is writing.

use tracing::{info, warn};

use crate::artifacts::{ArtifactStore, RESUME_PREFIX};
use crate::errors::AppError;
use crate::store::Store;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub finished_deletions: usize,
    pub orphans_removed: usize,
    pub temp_files_removed: usize,
}

/// Finishes deletes that were claimed but never completed, sweeps leftovers
/// of interrupted writes, then removes artifacts under `resumes/` that no
/// record references.
pub async fn reconcile(
    store: &dyn Store,
    artifacts: &dyn ArtifactStore,
) -> Result<ReconcileReport, AppError> {
    let mut report = ReconcileReport::default();

    for row in store.abandoned_deletions().await? {
        let mut removed = true;
        for key in [&row.pdf_key, &row.docx_key] {
            if let Err(e) = artifacts.delete(key).await {
                warn!("Could not finish deleting artifact {key} of resume {}: {e}", row.id);
                removed = false;
            }
        }
        if removed {
            store.remove_resume(row.id).await?;
            report.finished_deletions += 1;
        }
    }

    report.temp_files_removed = artifacts.sweep_incomplete().await?;

    let referenced = store.referenced_artifact_keys().await?;
    for key in artifacts.list(RESUME_PREFIX).await? {
        if referenced.contains(&key) {
            continue;
        }
        match artifacts.delete(&key).await {
            Ok(()) => report.orphans_removed += 1,
            Err(e) => warn!("Could not remove orphaned artifact {key}: {e}"),
        }
    }

    info!(
        "Reconciliation finished: {} abandoned deletion(s) completed, {} orphaned artifact(s) removed, {} incomplete write(s) swept",
        report.finished_deletions, report.orphans_removed, report.temp_files_removed
    );
    Ok(report)
}
