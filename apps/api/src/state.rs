use std::sync::Arc;

use chrono::Duration;

use crate::artifacts::ArtifactStore;
use crate::auth::delivery::CodeDelivery;
use crate::auth::ledger::VerificationLedger;
use crate::auth::session::SessionStore;
use crate::config::Config;
use crate::engine::ResumeEngine;
use crate::resumes::ArtifactPipeline;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<dyn SessionStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    /// Stub or LLM-backed, chosen once from `RESUME_ENGINE`.
    pub engine: Arc<dyn ResumeEngine>,
    pub delivery: Arc<dyn CodeDelivery>,
    pub config: Config,
}

impl AppState {
    pub fn ledger(&self) -> VerificationLedger {
        VerificationLedger::new(
            self.store.clone(),
            self.delivery.clone(),
            Duration::minutes(i64::from(self.config.code_ttl_minutes)),
        )
    }

    pub fn pipeline(&self) -> ArtifactPipeline {
        ArtifactPipeline::new(
            self.store.clone(),
            self.artifacts.clone(),
            self.engine.clone(),
        )
    }
}
