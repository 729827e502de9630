//! Persistence boundary for identities, profiles and generated resumes.
//!
//! `AppState` holds an `Arc<dyn Store>`; `PgStore` is the production backend.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::identity::IdentityRow;
use crate::models::profile::{ProfileInput, ProfileRow};
use crate::models::resume::{NewResume, ResumeRow};

pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Creates the identity if absent, then overwrites any outstanding code.
    async fn upsert_identity_code(
        &self,
        email: &str,
        code: &str,
        expiry: DateTime<Utc>,
    ) -> Result<IdentityRow, AppError>;

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<IdentityRow>, AppError>;

    async fn find_identity(&self, id: Uuid) -> Result<Option<IdentityRow>, AppError>;

    /// Marks the identity verified and clears the code, but only if `code` is
    /// still the outstanding one. Returns `None` when another caller got there first.
    async fn consume_code(&self, id: Uuid, code: &str) -> Result<Option<IdentityRow>, AppError>;

    /// Clears the outstanding code if it is still `code`.
    async fn clear_code(&self, id: Uuid, code: &str) -> Result<(), AppError>;

    async fn get_profile(&self, identity_id: Uuid) -> Result<Option<ProfileRow>, AppError>;

    async fn upsert_profile(
        &self,
        identity_id: Uuid,
        input: &ProfileInput,
    ) -> Result<ProfileRow, AppError>;

    async fn insert_resume(&self, resume: &NewResume) -> Result<ResumeRow, AppError>;

    /// Owned, unclaimed record or `None`.
    async fn find_resume(&self, identity_id: Uuid, id: Uuid) -> Result<Option<ResumeRow>, AppError>;

    /// Newest first, claimed records excluded.
    async fn list_resumes(&self, identity_id: Uuid, limit: i64)
        -> Result<Vec<ResumeRow>, AppError>;

    /// Atomically marks an owned, unclaimed record as being deleted.
    /// At most one concurrent caller receives `Some`.
    async fn claim_resume_deletion(
        &self,
        identity_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ResumeRow>, AppError>;

    async fn release_resume_deletion(&self, id: Uuid) -> Result<(), AppError>;

    async fn remove_resume(&self, id: Uuid) -> Result<(), AppError>;

    /// Records left claimed by a delete that never finished.
    async fn abandoned_deletions(&self) -> Result<Vec<ResumeRow>, AppError>;

    /// Every artifact key referenced by any record, claimed or not.
    async fn referenced_artifact_keys(&self) -> Result<HashSet<String>, AppError>;
}
