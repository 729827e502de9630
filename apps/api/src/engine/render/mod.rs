//! Document model shared by every engine, plus PDF and DOCX renderers.

use chrono::NaiveDate;
use url::Url;

pub mod docx;
pub mod pdf;

pub use docx::render_docx;
pub use pdf::render_pdf;

/// A renderer-neutral resume: a heading block followed by titled sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResumeDocument {
    pub name: String,
    pub contact: Vec<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(String),
    Bullet(String),
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn paragraph(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn bullet(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Bullet(text.into()));
        self
    }
}

/// `Resume_<Name_With_Underscores>_<host>_<YYYYMMDD>.{pdf,docx}`
pub fn artifact_filenames(full_name: &str, job_url: &Url, date: NaiveDate) -> (String, String) {
    let name = full_name
        .split_whitespace()
        .map(safe_filename_part)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let name = if name.is_empty() {
        "Resume".to_string()
    } else {
        name
    };
    let host = job_url
        .host_str()
        .map(safe_filename_part)
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "job".to_string());
    let stem = format!("Resume_{name}_{host}_{}", date.format("%Y%m%d"));
    (format!("{stem}.pdf"), format!("{stem}.docx"))
}

fn safe_filename_part(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
        .collect()
}
