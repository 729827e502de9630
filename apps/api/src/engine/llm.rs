//! LLM engine: fetches the posting, asks Claude to tailor the profile to it,
//! and renders the result with the shared PDF/DOCX renderers.
//!
//! Flow: validate URL → fetch posting → strip markup → LLM tailor → coverage → render.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::engine::coverage::keyword_coverage;
use crate::engine::prompts::{TAILOR_PROMPT_TEMPLATE, TAILOR_SYSTEM};
use crate::engine::render::{
    artifact_filenames, render_docx, render_pdf, ResumeDocument, Section,
};
use crate::engine::{validate_job_url, EngineError, EngineOutput, ProfileSnapshot, ResumeEngine};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};

const FETCH_TIMEOUT_SECS: u64 = 20;
/// Posting text beyond this is dropped before prompting.
const MAX_POSTING_CHARS: usize = 12_000;
const MAX_BULLETS: usize = 6;

/// Structured tailoring output requested from the model.
#[derive(Debug, Clone, Deserialize)]
pub struct TailoredContent {
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_bullets: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

pub struct LlmEngine {
    llm: LlmClient,
    http: reqwest::Client,
}

impl LlmEngine {
    pub fn new(llm: LlmClient) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(concat!("autotailor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EngineError::EngineUnavailable(format!("HTTP client: {e}")))?;
        Ok(Self { llm, http })
    }

    async fn fetch_posting(&self, url: &Url) -> Result<String, EngineError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| EngineError::EngineUnavailable(format!("fetching {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::EngineUnavailable(format!(
                "fetching {url}: HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EngineError::EngineUnavailable(format!("reading {url}: {e}")))?;

        let text = html_to_text(&body);
        if text.is_empty() {
            return Err(EngineError::GenerationFailed(format!(
                "posting at {url} has no readable text"
            )));
        }
        Ok(text.chars().take(MAX_POSTING_CHARS).collect())
    }
}

#[async_trait]
impl ResumeEngine for LlmEngine {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn generate(
        &self,
        profile: &ProfileSnapshot,
        job_url: &str,
    ) -> Result<EngineOutput, EngineError> {
        let url = validate_job_url(job_url)?;

        let llm = match profile.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => self.llm.with_api_key(key.to_string()),
            _ if self.llm.has_api_key() => self.llm.clone(),
            _ => {
                return Err(EngineError::EngineUnavailable(
                    "no Anthropic API key configured".to_string(),
                ))
            }
        };

        let posting = self.fetch_posting(&url).await?;
        info!("Fetched posting from {} ({} chars)", url, posting.len());

        let prompt = build_prompt(profile, &posting)?;
        let system = format!("{TAILOR_SYSTEM} {JSON_ONLY_SYSTEM}");
        let tailored: TailoredContent = llm
            .call_json(&prompt, &system)
            .await
            .map_err(map_llm_error)?;

        if tailored.summary.trim().is_empty() && tailored.experience_bullets.is_empty() {
            return Err(EngineError::GenerationFailed(
                "model returned no usable content".to_string(),
            ));
        }

        let doc = build_document(profile, &tailored);
        let pdf = render_pdf(&doc);
        let docx = render_docx(&doc)?;
        let (pdf_filename, docx_filename) =
            artifact_filenames(&profile.full_name, &url, Utc::now().date_naive());

        let coverage = keyword_coverage(&tailored.keywords, &profile_text(profile));
        info!(
            "Tailored resume for {}: coverage {:.2} ({} matched, {} missing)",
            url.host_str().unwrap_or("job"),
            coverage.score,
            coverage.matched.len(),
            coverage.missing.len()
        );
        let coverage = serde_json::to_value(coverage)
            .map_err(|e| EngineError::GenerationFailed(format!("coverage serialization: {e}")))?;

        Ok(EngineOutput {
            pdf_bytes: Bytes::from(pdf),
            docx_bytes: Bytes::from(docx),
            pdf_filename,
            docx_filename,
            coverage,
        })
    }
}

fn map_llm_error(e: LlmError) -> EngineError {
    if e.is_transient() {
        warn!("LLM provider unavailable: {e}");
        EngineError::EngineUnavailable(format!("LLM call failed: {e}"))
    } else {
        EngineError::GenerationFailed(format!("LLM call failed: {e}"))
    }
}

fn build_prompt(profile: &ProfileSnapshot, posting: &str) -> Result<String, EngineError> {
    let profile_json = serde_json::to_string_pretty(profile)
        .map_err(|e| EngineError::GenerationFailed(format!("profile serialization: {e}")))?;
    Ok(TAILOR_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{profile_json}", &profile_json)
        .replace("{posting_text}", posting))
}

/// Everything the candidate wrote about themselves, for coverage matching.
fn profile_text(profile: &ProfileSnapshot) -> String {
    [profile.about.as_deref(), profile.github.as_deref(), profile.linkedin.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_document(profile: &ProfileSnapshot, tailored: &TailoredContent) -> ResumeDocument {
    let mut sections = Vec::new();

    let summary = tailored.summary.trim();
    if !summary.is_empty() {
        sections.push(Section::new("Summary").paragraph(summary));
    }

    let skills: Vec<&str> = tailored
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !skills.is_empty() {
        sections.push(Section::new("Skills").paragraph(skills.join(", ")));
    }

    let bullets: Vec<&str> = tailored
        .experience_bullets
        .iter()
        .map(|b| b.trim().trim_start_matches(['-', '*', '\u{2022}']).trim())
        .filter(|b| !b.is_empty())
        .take(MAX_BULLETS)
        .collect();
    if !bullets.is_empty() {
        sections.push(
            bullets
                .into_iter()
                .fold(Section::new("Experience"), |section, b| section.bullet(b)),
        );
    }

    ResumeDocument {
        name: profile.full_name.trim().to_string(),
        contact: profile
            .contact_fields()
            .into_iter()
            .map(str::to_string)
            .collect(),
        sections,
    }
}

/// Reduces an HTML page to whitespace-normalized visible text.
/// Script and style bodies are dropped; common entities are decoded.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let lower = html.to_ascii_lowercase();
    let mut i = 0;

    while i < html.len() {
        let rest = &html[i..];
        if rest.starts_with('<') {
            let lower_rest = &lower[i..];
            let skip_until = if lower_rest.starts_with("<script") {
                Some("</script>")
            } else if lower_rest.starts_with("<style") {
                Some("</style>")
            } else {
                None
            };
            if let Some(closing) = skip_until {
                i = match lower_rest.find(closing) {
                    Some(pos) => i + pos + closing.len(),
                    None => html.len(),
                };
            } else {
                i = match rest.find('>') {
                    Some(pos) => i + pos + 1,
                    None => html.len(),
                };
            }
            out.push(' ');
            continue;
        }

        let next_tag = rest.find('<').unwrap_or(rest.len());
        out.push_str(&decode_entities(&rest[..next_tag]));
        i += next_tag;
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
