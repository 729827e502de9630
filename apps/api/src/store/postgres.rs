use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::identity::IdentityRow;
use crate::models::profile::{ProfileInput, ProfileRow};
use crate::models::resume::{NewResume, ResumeRow};
use crate::store::Store;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_identity_code(
        &self,
        email: &str,
        code: &str,
        expiry: DateTime<Utc>,
    ) -> Result<IdentityRow, AppError> {
        Ok(sqlx::query_as::<_, IdentityRow>(
            r#"
            INSERT INTO identities (id, email, verify_code, verify_expiry)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
                SET verify_code = EXCLUDED.verify_code,
                    verify_expiry = EXCLUDED.verify_expiry
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(code)
        .bind(expiry)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<IdentityRow>, AppError> {
        Ok(
            sqlx::query_as::<_, IdentityRow>("SELECT * FROM identities WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<IdentityRow>, AppError> {
        Ok(
            sqlx::query_as::<_, IdentityRow>("SELECT * FROM identities WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn consume_code(&self, id: Uuid, code: &str) -> Result<Option<IdentityRow>, AppError> {
        Ok(sqlx::query_as::<_, IdentityRow>(
            r#"
            UPDATE identities
            SET verified = TRUE, verify_code = NULL, verify_expiry = NULL
            WHERE id = $1 AND verify_code = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn clear_code(&self, id: Uuid, code: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE identities SET verify_code = NULL, verify_expiry = NULL \
             WHERE id = $1 AND verify_code = $2",
        )
        .bind(id)
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_profile(&self, identity_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE identity_id = $1")
                .bind(identity_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn upsert_profile(
        &self,
        identity_id: Uuid,
        input: &ProfileInput,
    ) -> Result<ProfileRow, AppError> {
        Ok(sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles
                (identity_id, full_name, city, email, phone, linkedin, github, about, api_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (identity_id) DO UPDATE
                SET full_name = EXCLUDED.full_name,
                    city = EXCLUDED.city,
                    email = EXCLUDED.email,
                    phone = EXCLUDED.phone,
                    linkedin = EXCLUDED.linkedin,
                    github = EXCLUDED.github,
                    about = EXCLUDED.about,
                    api_key = EXCLUDED.api_key,
                    updated_at = now()
            RETURNING *
            "#,
        )
        .bind(identity_id)
        .bind(&input.full_name)
        .bind(&input.city)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.linkedin)
        .bind(&input.github)
        .bind(&input.about)
        .bind(&input.api_key)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn insert_resume(&self, resume: &NewResume) -> Result<ResumeRow, AppError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO generated_resumes
                (id, identity_id, job_url, pdf_key, docx_key, pdf_name, docx_name, coverage_json)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(resume.id)
        .bind(resume.identity_id)
        .bind(&resume.job_url)
        .bind(&resume.pdf_key)
        .bind(&resume.docx_key)
        .bind(&resume.pdf_name)
        .bind(&resume.docx_name)
        .bind(&resume.coverage_json)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_resume(&self, identity_id: Uuid, id: Uuid) -> Result<Option<ResumeRow>, AppError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM generated_resumes \
             WHERE id = $1 AND identity_id = $2 AND deleting_at IS NULL",
        )
        .bind(id)
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_resumes(
        &self,
        identity_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ResumeRow>, AppError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            r#"
            SELECT * FROM generated_resumes
            WHERE identity_id = $1 AND deleting_at IS NULL
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(identity_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn claim_resume_deletion(
        &self,
        identity_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ResumeRow>, AppError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            r#"
            UPDATE generated_resumes
            SET deleting_at = now()
            WHERE id = $1 AND identity_id = $2 AND deleting_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn release_resume_deletion(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE generated_resumes SET deleting_at = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_resume(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM generated_resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn abandoned_deletions(&self) -> Result<Vec<ResumeRow>, AppError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM generated_resumes WHERE deleting_at IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn referenced_artifact_keys(&self) -> Result<HashSet<String>, AppError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT pdf_key, docx_key FROM generated_resumes")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .flat_map(|(pdf, docx)| [pdf, docx])
            .collect())
    }
}
