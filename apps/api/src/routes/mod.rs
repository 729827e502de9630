pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::profile::handlers as profile;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sign-in
        .route("/api/v1/auth/signin", post(auth::handle_signin))
        .route("/api/v1/auth/verify", post(auth::handle_verify))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/me", get(auth::handle_me))
        // Profile
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).put(profile::handle_put_profile),
        )
        // Resumes
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list).post(resumes::handle_generate),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get).delete(resumes::handle_delete),
        )
        .route(
            "/api/v1/resumes/:id/download/:kind",
            get(resumes::handle_download),
        )
        .with_state(state)
}
