//! Session Gate: bearer tokens backed by Redis.
//!
//! A session is `session:<token> → identity id` with a TTL. Handlers never look
//! sessions up themselves; they take a `CurrentIdentity` or `VerifiedIdentity`
//! extractor and receive the resolved identity as an explicit value.

use std::time::Duration;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use rand::distributions::Alphanumeric;
use rand::Rng;
use redis::aio::MultiplexedConnection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::identity::IdentityRow;
use crate::state::AppState;

pub const SESSION_TOKEN_LEN: usize = 48;
const KEY_PREFIX: &str = "session:";

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Opens a session for `identity_id` and returns its token.
    async fn create(&self, identity_id: Uuid, ttl: Duration) -> Result<String, AppError>;

    /// Identity id for a live session, `None` for unknown or expired tokens.
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError>;

    /// Ends the session. Unknown tokens are ignored.
    async fn revoke(&self, token: &str) -> Result<(), AppError>;
}

pub fn new_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn session_key(token: &str) -> String {
    format!("{KEY_PREFIX}{token}")
}

/// Tokens are only ever produced by `new_session_token`; anything else is rejected
/// before it reaches Redis.
fn is_well_formed(token: &str) -> bool {
    token.len() == SESSION_TOKEN_LEN && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
}

impl RedisSessionStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, identity_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let token = new_session_token();
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(session_key(&token))
            .arg(identity_id.to_string())
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        if !is_well_formed(token) {
            return Ok(None);
        }
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(session_key(token))
            .query_async(&mut conn)
            .await?;
        Ok(value.and_then(|v| Uuid::parse_str(&v).ok()))
    }

    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        if !is_well_formed(token) {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(session_key(token))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

/// Fails `Unverified` unless the identity has completed a code verification.
pub fn require_verified(identity: &IdentityRow) -> Result<(), AppError> {
    if identity.verified {
        Ok(())
    } else {
        Err(AppError::Unverified)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Identity resolved from the request's bearer token, together with that token.
#[derive(Debug, Clone)]
pub struct CurrentIdentity {
    pub token: String,
    pub identity: IdentityRow,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(parts).ok_or(AppError::Unauthenticated)?;
        let identity_id = state
            .sessions
            .resolve(token)
            .await?
            .ok_or(AppError::Unauthenticated)?;
        let identity = state
            .store
            .find_identity(identity_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(CurrentIdentity {
            token: token.to_string(),
            identity,
        })
    }
}

/// A `CurrentIdentity` that has also passed `require_verified`.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity(pub IdentityRow);

#[async_trait]
impl FromRequestParts<AppState> for VerifiedIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let CurrentIdentity { identity, .. } =
            CurrentIdentity::from_request_parts(parts, state).await?;
        require_verified(&identity)?;
        Ok(VerifiedIdentity(identity))
    }
}
