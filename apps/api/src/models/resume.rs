use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One completed generation. Exists only while both artifacts exist in storage.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub job_url: String,
    pub pdf_key: String,
    pub docx_key: String,
    pub pdf_name: String,
    pub docx_name: String,
    /// Engine coverage exactly as serialized at generation time.
    pub coverage_json: String,
    pub created_at: DateTime<Utc>,
    /// Set when a delete has claimed the record; the row is then invisible to readers.
    pub deleting_at: Option<DateTime<Utc>>,
}

/// Insert payload for a resume whose artifacts have already been written.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub job_url: String,
    pub pdf_key: String,
    pub docx_key: String,
    pub pdf_name: String,
    pub docx_name: String,
    pub coverage_json: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeSummary {
    pub id: Uuid,
    pub job_url: String,
    pub job_host: String,
    pub pdf_name: String,
    pub docx_name: String,
    pub coverage: Value,
    pub created_at: DateTime<Utc>,
}

impl From<&ResumeRow> for ResumeSummary {
    fn from(row: &ResumeRow) -> Self {
        let job_host = url::Url::parse(&row.job_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "job".to_string());
        Self {
            id: row.id,
            job_url: row.job_url.clone(),
            job_host,
            pdf_name: row.pdf_name.clone(),
            docx_name: row.docx_name.clone(),
            coverage: serde_json::from_str(&row.coverage_json).unwrap_or(Value::Null),
            created_at: row.created_at,
        }
    }
}
