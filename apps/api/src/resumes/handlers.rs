use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::artifacts::ArtifactKind;
use crate::auth::session::VerifiedIdentity;
use crate::errors::AppError;
use crate::models::resume::ResumeSummary;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub job_url: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// POST /api/v1/resumes
pub async fn handle_generate(
    State(state): State<AppState>,
    VerifiedIdentity(identity): VerifiedIdentity,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<ResumeSummary>), AppError> {
    let row = state.pipeline().generate(&identity, &req.job_url).await?;
    Ok((StatusCode::CREATED, Json(ResumeSummary::from(&row))))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    VerifiedIdentity(identity): VerifiedIdentity,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    let rows = state.pipeline().list(&identity, params.limit).await?;
    Ok(Json(rows.iter().map(ResumeSummary::from).collect()))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    VerifiedIdentity(identity): VerifiedIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeSummary>, AppError> {
    let row = state.pipeline().summary(&identity, id).await?;
    Ok(Json(ResumeSummary::from(&row)))
}

/// GET /api/v1/resumes/:id/download/:kind
pub async fn handle_download(
    State(state): State<AppState>,
    VerifiedIdentity(identity): VerifiedIdentity,
    Path((id, kind)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = ArtifactKind::parse(&kind)
        .ok_or_else(|| AppError::NotFound(format!("Unknown artifact kind '{kind}'")))?;
    let artifact = state.pipeline().fetch(&identity, id, kind).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe_filename(&artifact.filename, kind)
    );
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    ))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    VerifiedIdentity(identity): VerifiedIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.pipeline().delete(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Filename restricted to characters that are safe inside a quoted header value.
fn header_safe_filename(name: &str, kind: ArtifactKind) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        format!("resume.{}", kind.extension())
    } else {
        cleaned.to_string()
    }
}
