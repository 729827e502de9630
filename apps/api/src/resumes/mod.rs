//! Artifact Pipeline: generation, retrieval and deletion of resume artifacts.
//!
//! Invariant: a `generated_resumes` row exists iff both of its artifacts exist.
//!
//! generate: engine → put PDF → put DOCX → insert row. Each failure removes what
//! was already written. Persistence runs on its own task, so a dropped request
//! still reaches either the committed row or a full rollback.
//!
//! delete: claim row → delete both artifacts → delete row. A claimed row is
//! invisible to readers. The claim is released only if no artifact was removed;
//! otherwise the row stays claimed and `reconcile` finishes the delete.

pub mod handlers;
pub mod reconcile;

use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::artifacts::{artifact_key, ArtifactKind, ArtifactStore};
use crate::auth::session::require_verified;
use crate::engine::{validate_job_url, EngineOutput, ProfileSnapshot, ResumeEngine};
use crate::errors::AppError;
use crate::models::identity::IdentityRow;
use crate::models::resume::{NewResume, ResumeRow};
use crate::store::Store;

pub const DEFAULT_LIST_LIMIT: i64 = 5;
pub const MAX_LIST_LIMIT: i64 = 50;

/// Bytes of one stored artifact plus what a download needs to present them.
#[derive(Debug, Clone)]
pub struct FetchedArtifact {
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: &'static str,
}

#[derive(Clone)]
pub struct ArtifactPipeline {
    store: Arc<dyn Store>,
    artifacts: Arc<dyn ArtifactStore>,
    engine: Arc<dyn ResumeEngine>,
}

impl ArtifactPipeline {
    pub fn new(
        store: Arc<dyn Store>,
        artifacts: Arc<dyn ArtifactStore>,
        engine: Arc<dyn ResumeEngine>,
    ) -> Self {
        Self {
            store,
            artifacts,
            engine,
        }
    }

    /// Runs the engine for `job_url` and persists its output as one new record.
    pub async fn generate(
        &self,
        identity: &IdentityRow,
        job_url: &str,
    ) -> Result<ResumeRow, AppError> {
        require_verified(identity)?;

        let profile = self
            .store
            .get_profile(identity.id)
            .await?
            .filter(|p| p.is_complete())
            .ok_or(AppError::ProfileMissing)?;

        let job_url = job_url.trim();
        validate_job_url(job_url)?;

        let snapshot = ProfileSnapshot::from_profile(&profile, identity);
        let output = self
            .engine
            .generate(&snapshot, job_url)
            .await
            .map_err(|e| {
                warn!(
                    "Engine '{}' failed for identity {}: {e}",
                    self.engine.name(),
                    identity.id
                );
                AppError::from(e)
            })?;

        let resume = new_resume(identity.id, job_url, &output)?;
        let store = self.store.clone();
        let artifacts = self.artifacts.clone();

        let row = tokio::spawn(async move {
            persist(
                store.as_ref(),
                artifacts.as_ref(),
                resume,
                output.pdf_bytes,
                output.docx_bytes,
            )
            .await
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Persistence task failed: {e}")))??;

        info!(
            "Generated resume {} for identity {} via '{}'",
            row.id,
            identity.id,
            self.engine.name()
        );
        Ok(row)
    }

    /// Stored bytes and display filename for one artifact of an owned record.
    pub async fn fetch(
        &self,
        identity: &IdentityRow,
        record_id: Uuid,
        kind: ArtifactKind,
    ) -> Result<FetchedArtifact, AppError> {
        let row = self.summary(identity, record_id).await?;
        let (key, filename) = match kind {
            ArtifactKind::Pdf => (row.pdf_key, row.pdf_name),
            ArtifactKind::Docx => (row.docx_key, row.docx_name),
        };

        let bytes = self.artifacts.get(&key).await?.ok_or_else(|| {
            warn!("Resume {record_id} references missing artifact {key}");
            not_found()
        })?;

        Ok(FetchedArtifact {
            bytes,
            filename,
            content_type: kind.content_type(),
        })
    }

    /// Removes both artifacts, then the record.
    pub async fn delete(&self, identity: &IdentityRow, record_id: Uuid) -> Result<(), AppError> {
        let row = self
            .store
            .claim_resume_deletion(identity.id, record_id)
            .await?
            .ok_or_else(not_found)?;

        for (removed, key) in [&row.pdf_key, &row.docx_key].into_iter().enumerate() {
            if let Err(e) = self.artifacts.delete(key).await {
                error!("Failed to delete artifact {key} of resume {record_id}: {e}");
                if removed == 0 {
                    self.store.release_resume_deletion(record_id).await?;
                } else {
                    // Both files are no longer intact; the row stays claimed for `reconcile`.
                    warn!("Resume {record_id} left claimed after a partial delete");
                }
                return Err(e.into());
            }
        }

        self.store.remove_resume(record_id).await?;
        info!("Deleted resume {record_id} for identity {}", identity.id);
        Ok(())
    }

    /// Newest first. `limit` is clamped to `1..=MAX_LIST_LIMIT`.
    pub async fn list(
        &self,
        identity: &IdentityRow,
        limit: Option<i64>,
    ) -> Result<Vec<ResumeRow>, AppError> {
        let limit = limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        self.store.list_resumes(identity.id, limit).await
    }

    pub async fn summary(
        &self,
        identity: &IdentityRow,
        record_id: Uuid,
    ) -> Result<ResumeRow, AppError> {
        self.store
            .find_resume(identity.id, record_id)
            .await?
            .ok_or_else(not_found)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Resume not found".to_string())
}

fn new_resume(
    identity_id: Uuid,
    job_url: &str,
    output: &EngineOutput,
) -> Result<NewResume, AppError> {
    let coverage_json = serde_json::to_string(&output.coverage)
        .map_err(|e| AppError::GenerationFailed(format!("coverage is not serializable: {e}")))?;
    let id = Uuid::new_v4();

    Ok(NewResume {
        id,
        identity_id,
        job_url: job_url.to_string(),
        pdf_key: artifact_key(identity_id, id, ArtifactKind::Pdf),
        docx_key: artifact_key(identity_id, id, ArtifactKind::Docx),
        pdf_name: output.pdf_filename.clone(),
        docx_name: output.docx_filename.clone(),
        coverage_json,
    })
}

async fn persist(
    store: &dyn Store,
    artifacts: &dyn ArtifactStore,
    resume: NewResume,
    pdf: Bytes,
    docx: Bytes,
) -> Result<ResumeRow, AppError> {
    artifacts
        .put(&resume.pdf_key, pdf, ArtifactKind::Pdf.content_type())
        .await?;

    if let Err(e) = artifacts
        .put(&resume.docx_key, docx, ArtifactKind::Docx.content_type())
        .await
    {
        remove_artifacts(artifacts, &[resume.pdf_key.as_str()]).await;
        return Err(e.into());
    }

    match store.insert_resume(&resume).await {
        Ok(row) => Ok(row),
        Err(e) => {
            remove_artifacts(artifacts, &[resume.pdf_key.as_str(), resume.docx_key.as_str()])
                .await;
            Err(e)
        }
    }
}

/// Compensating cleanup. Anything left behind is swept by `reconcile` at startup.
async fn remove_artifacts(artifacts: &dyn ArtifactStore, keys: &[&str]) {
    for key in keys {
        match artifacts.delete(key).await {
            Ok(()) => info!("Rolled back artifact {key}"),
            Err(e) => error!("Rollback of artifact {key} failed: {e}"),
        }
    }
}
