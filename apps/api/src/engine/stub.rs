//! Stub engine: templated resume content, no network, no model calls.
//!
//! Output honours the full engine contract: a real PDF, a real DOCX, both
//! filenames and a coverage value of the documented shape.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::debug;

use crate::engine::coverage::{keyword_coverage, keywords_from_url};
use crate::engine::render::{
    artifact_filenames, render_docx, render_pdf, ResumeDocument, Section,
};
use crate::engine::{validate_job_url, EngineError, EngineOutput, ProfileSnapshot, ResumeEngine};

const PLACEHOLDER_BULLETS: &[&str] = &[
    "Contributed to team projects with clear communication and documentation.",
    "Applied standard problem-solving and data handling techniques where appropriate.",
];

pub struct StubEngine;

#[async_trait]
impl ResumeEngine for StubEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn generate(
        &self,
        profile: &ProfileSnapshot,
        job_url: &str,
    ) -> Result<EngineOutput, EngineError> {
        let url = validate_job_url(job_url)?;

        let doc = build_document(profile, url.as_str());
        let pdf = render_pdf(&doc);
        let docx = render_docx(&doc)?;

        let (pdf_filename, docx_filename) =
            artifact_filenames(&profile.full_name, &url, Utc::now().date_naive());

        let keywords = keywords_from_url(&url);
        let coverage = keyword_coverage(&keywords, profile.about.as_deref().unwrap_or_default());
        let coverage = serde_json::to_value(coverage)
            .map_err(|e| EngineError::GenerationFailed(format!("coverage serialization: {e}")))?;

        debug!(
            "Stub engine produced {} PDF bytes and {} DOCX bytes",
            pdf.len(),
            docx.len()
        );

        Ok(EngineOutput {
            pdf_bytes: Bytes::from(pdf),
            docx_bytes: Bytes::from(docx),
            pdf_filename,
            docx_filename,
            coverage,
        })
    }
}

fn build_document(profile: &ProfileSnapshot, job_url: &str) -> ResumeDocument {
    let mut sections = Vec::new();

    if let Some(about) = profile.about.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        sections.push(Section::new("Summary").paragraph(about));
    }

    sections.push(Section::new("Target").paragraph(format!("(Stub) Tailored for: {job_url}")));

    let experience = PLACEHOLDER_BULLETS
        .iter()
        .fold(Section::new("Experience"), |section, bullet| {
            section.bullet(*bullet)
        });
    sections.push(experience);

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

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::engine::coverage::Coverage;

    fn profile() -> ProfileSnapshot {
        ProfileSnapshot {
            full_name: "Ada Lovelace".to_string(),
            city: Some("London".to_string()),
            email: Some("ada@example.com".to_string()),
            about: Some("Rust engineer who enjoys distributed systems.".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_stub_rejects_malformed_url() {
        let err = StubEngine.generate(&profile(), "not a url").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidJobUrl(_)));
    }

    #[tokio::test]
    async fn test_stub_produces_readable_pdf() {
        let out = StubEngine
            .generate(&profile(), "https://jobs.example.com/123")
            .await
            .unwrap();
        let text = pdf_extract::extract_text_from_mem(&out.pdf_bytes).unwrap();
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("jobs.example.com/123"));
    }

    #[tokio::test]
    async fn test_stub_produces_readable_docx() {
        let out = StubEngine
            .generate(&profile(), "https://jobs.example.com/123")
            .await
            .unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(out.docx_bytes.to_vec())).unwrap();
        let mut document = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut document)
            .unwrap();
        assert!(document.contains("Ada Lovelace"));
        assert!(document.contains("Experience"));
    }

    #[tokio::test]
    async fn test_stub_filenames_and_coverage_shape() {
        let out = StubEngine
            .generate(&profile(), "https://example.com/jobs/rust-kafka-engineer")
            .await
            .unwrap();

        assert!(out.pdf_filename.starts_with("Resume_Ada_Lovelace_example.com_"));
        assert!(out.pdf_filename.ends_with(".pdf"));
        assert!(out.docx_filename.ends_with(".docx"));
        assert_ne!(out.pdf_filename, out.docx_filename);

        let coverage: Coverage = serde_json::from_value(out.coverage).unwrap();
        assert_eq!(coverage.matched, vec!["rust", "engineer"]);
        assert_eq!(coverage.missing, vec!["kafka"]);
        assert!((0.0..=1.0).contains(&coverage.score));
    }

    #[tokio::test]
    async fn test_stub_coverage_for_numeric_posting() {
        let out = StubEngine
            .generate(&profile(), "https://jobs.example.com/123")
            .await
            .unwrap();
        assert_eq!(
            out.coverage,
            serde_json::json!({"matched": [], "missing": [], "score": 0.0})
        );
    }
}
