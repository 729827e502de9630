use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::session::CurrentIdentity;
use crate::errors::AppError;
use crate::models::identity::IdentitySummary;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub token: String,
    pub identity: IdentitySummary,
    pub profile_complete: bool,
}

/// POST /api/v1/auth/signin
pub async fn handle_signin(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.ledger().issue(&req.email, Utc::now()).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "code_sent" })),
    ))
}

/// POST /api/v1/auth/verify
pub async fn handle_verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let identity = state.ledger().verify(&req.email, &req.code, Utc::now()).await?;

    let ttl = Duration::from_secs(u64::from(state.config.session_ttl_hours) * 3600);
    let token = state.sessions.create(identity.id, ttl).await?;
    info!("Session opened for identity {}", identity.id);

    let profile_complete = state
        .store
        .get_profile(identity.id)
        .await?
        .is_some_and(|p| p.is_complete());

    Ok(Json(VerifyResponse {
        token,
        identity: IdentitySummary::from(&identity),
        profile_complete,
    }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    current: CurrentIdentity,
) -> Result<StatusCode, AppError> {
    state.sessions.revoke(&current.token).await?;
    info!("Session closed for identity {}", current.identity.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/me
pub async fn handle_me(current: CurrentIdentity) -> Json<IdentitySummary> {
    Json(IdentitySummary::from(&current.identity))
}
