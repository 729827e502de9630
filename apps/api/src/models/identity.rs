use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A sign-in identity keyed by its case-normalized email.
///
/// `verify_code` and `verify_expiry` are set together by an issue and cleared
/// together once the code is consumed or found expired.
#[derive(Debug, Clone, FromRow)]
pub struct IdentityRow {
    pub id: Uuid,
    pub email: String,
    pub verified: bool,
    pub verify_code: Option<String>,
    pub verify_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Public view of an identity. Never carries the outstanding code.
#[derive(Debug, Clone, Serialize)]
pub struct IdentitySummary {
    pub id: Uuid,
    pub email: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&IdentityRow> for IdentitySummary {
    fn from(row: &IdentityRow) -> Self {
        Self {
            id: row.id,
            email: row.email.clone(),
            verified: row.verified,
            created_at: row.created_at,
        }
    }
}
