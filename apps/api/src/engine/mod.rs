//! Resume Engine: the fixed-signature boundary to content generation.
//!
//! `generate(profile, job_url) -> EngineOutput` is a compatibility contract: every
//! engine returns a PDF, a DOCX, a display filename for each, and a coverage value.
//!
//! Default: `StubEngine` (templated, deterministic, no network).
//! Alternative: `LlmEngine` (fetches the posting, tailors content via Claude).
//!
//! `AppState` holds an `Arc<dyn ResumeEngine>`, chosen at startup from config.
//! Engines never touch storage or the database.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::models::identity::IdentityRow;
use crate::models::profile::ProfileRow;

pub mod coverage;
pub mod llm;
pub mod prompts;
pub mod render;
pub mod stub;

pub use llm::LlmEngine;
pub use stub::StubEngine;

const MAX_JOB_URL_LEN: usize = 2000;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("invalid job URL: {0}")]
    InvalidJobUrl(String),

    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("generation failed: {0}")]
    GenerationFailed(String),
}

/// The profile fields handed to an engine. Field names are part of the contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub full_name: String,
    pub city: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub about: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl ProfileSnapshot {
    /// Builds the engine input. A blank contact email falls back to the sign-in email.
    pub fn from_profile(profile: &ProfileRow, identity: &IdentityRow) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            city: profile.city.clone(),
            email: profile
                .email
                .clone()
                .filter(|e| !e.trim().is_empty())
                .or_else(|| Some(identity.email.clone())),
            phone: profile.phone.clone(),
            linkedin: profile.linkedin.clone(),
            github: profile.github.clone(),
            about: profile.about.clone(),
            api_key: profile.api_key.clone(),
        }
    }

    /// Non-empty contact fields in display order.
    pub fn contact_fields(&self) -> Vec<&str> {
        [
            &self.city,
            &self.email,
            &self.phone,
            &self.linkedin,
            &self.github,
        ]
        .into_iter()
        .filter_map(|f| f.as_deref().map(str::trim))
        .filter(|f| !f.is_empty())
        .collect()
    }
}

/// Everything an engine returns for one generation.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub pdf_bytes: Bytes,
    pub docx_bytes: Bytes,
    pub pdf_filename: String,
    pub docx_filename: String,
    /// Engine-owned; stored and returned verbatim by the pipeline.
    pub coverage: Value,
}

#[async_trait]
pub trait ResumeEngine: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        profile: &ProfileSnapshot,
        job_url: &str,
    ) -> Result<EngineOutput, EngineError>;
}

/// Accepts absolute http(s) URLs with a host. Reachability is not checked.
pub fn validate_job_url(raw: &str) -> Result<Url, EngineError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(EngineError::InvalidJobUrl(
            "Paste a job posting URL".to_string(),
        ));
    }
    if raw.len() > MAX_JOB_URL_LEN {
        return Err(EngineError::InvalidJobUrl(format!(
            "Job URL must be at most {MAX_JOB_URL_LEN} characters"
        )));
    }

    let url = Url::parse(raw)
        .map_err(|e| EngineError::InvalidJobUrl(format!("'{raw}' is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(EngineError::InvalidJobUrl(format!(
            "Job URL must use http or https, got '{}'",
            url.scheme()
        )));
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(EngineError::InvalidJobUrl(format!(
            "Job URL '{raw}' has no host"
        )));
    }
    Ok(url)
}
