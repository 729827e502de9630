use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub identity_id: Uuid,
    pub full_name: String,
    pub city: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub about: Option<String>,
    pub api_key: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRow {
    /// A profile is usable for generation once it carries a full name.
    pub fn is_complete(&self) -> bool {
        !self.full_name.trim().is_empty()
    }
}

/// Profile fields as submitted by the user, and as persisted after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileInput {
    pub full_name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Profile as returned to its owner. The API key is reported only by presence.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub full_name: String,
    pub city: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub about: Option<String>,
    pub has_api_key: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for ProfileResponse {
    fn from(row: ProfileRow) -> Self {
        Self {
            has_api_key: row.api_key.is_some(),
            full_name: row.full_name,
            city: row.city,
            email: row.email,
            phone: row.phone,
            linkedin: row.linkedin,
            github: row.github,
            about: row.about,
            updated_at: row.updated_at,
        }
    }
}
