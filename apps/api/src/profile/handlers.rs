use axum::{extract::State, Json};

use crate::auth::session::VerifiedIdentity;
use crate::errors::AppError;
use crate::models::profile::{ProfileInput, ProfileResponse};
use crate::profile;
use crate::state::AppState;

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    VerifiedIdentity(identity): VerifiedIdentity,
) -> Result<Json<ProfileResponse>, AppError> {
    let row = profile::get(state.store.as_ref(), identity.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No profile saved yet".to_string()))?;
    Ok(Json(ProfileResponse::from(row)))
}

/// PUT /api/v1/profile
pub async fn handle_put_profile(
    State(state): State<AppState>,
    VerifiedIdentity(identity): VerifiedIdentity,
    Json(input): Json<ProfileInput>,
) -> Result<Json<ProfileResponse>, AppError> {
    let row = profile::save(state.store.as_ref(), identity.id, &input).await?;
    tracing::info!("Profile saved for identity {}", identity.id);
    Ok(Json(ProfileResponse::from(row)))
}
