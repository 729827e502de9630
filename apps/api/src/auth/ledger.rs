//! Verification Ledger: one-time sign-in codes per identity.
//!
//! State per identity: `Unverified → CodeIssued → {Verified | Expired}`; a wrong
//! code leaves the identity in `CodeIssued`. A later `issue` starts over.
//!
//! Transitions take `now` explicitly. Nothing in here reads the wall clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::auth::delivery::CodeDelivery;
use crate::errors::AppError;
use crate::models::identity::IdentityRow;
use crate::store::Store;

pub const CODE_LENGTH: usize = 6;
const MAX_EMAIL_LEN: usize = 255;

/// Outcome of checking a candidate against the stored (code, expiry) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Valid,
    /// No code outstanding.
    Missing,
    Expired,
    Mismatch,
}

/// Six uniformly random decimal digits, leading zeros kept.
pub fn generate_code<R: Rng>(rng: &mut R) -> String {
    format!("{:0width$}", rng.gen_range(0..1_000_000u32), width = CODE_LENGTH)
}

/// Byte-exact comparison in constant time for equal lengths.
pub fn codes_match(stored: &str, candidate: &str) -> bool {
    stored.len() == candidate.len() && bool::from(stored.as_bytes().ct_eq(candidate.as_bytes()))
}

/// Pure transition check. `now == expiry` is still valid.
pub fn check_code(
    stored: Option<&str>,
    expiry: Option<DateTime<Utc>>,
    candidate: &str,
    now: DateTime<Utc>,
) -> CodeCheck {
    let Some(stored) = stored else {
        return CodeCheck::Missing;
    };
    match expiry {
        Some(expiry) if now <= expiry => {}
        _ => return CodeCheck::Expired,
    }
    if codes_match(stored, candidate) {
        CodeCheck::Valid
    } else {
        CodeCheck::Mismatch
    }
}

/// Trims and lower-cases an email, rejecting obviously malformed input.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let invalid = || AppError::Validation(format!("'{}' is not a valid email address", raw.trim()));

    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(email)
}

pub struct VerificationLedger {
    store: Arc<dyn Store>,
    delivery: Arc<dyn CodeDelivery>,
    code_ttl: Duration,
}

impl VerificationLedger {
    pub fn new(store: Arc<dyn Store>, delivery: Arc<dyn CodeDelivery>, code_ttl: Duration) -> Self {
        Self {
            store,
            delivery,
            code_ttl,
        }
    }

    /// Issues a fresh code for `email`, creating the identity if needed.
    /// Any code issued earlier for the same email stops working.
    pub async fn issue(&self, email: &str, now: DateTime<Utc>) -> Result<IdentityRow, AppError> {
        let code = generate_code(&mut rand::thread_rng());
        self.issue_code(email, code, now).await
    }

    pub(crate) async fn issue_code(
        &self,
        email: &str,
        code: String,
        now: DateTime<Utc>,
    ) -> Result<IdentityRow, AppError> {
        let email = normalize_email(email)?;
        let expiry = now + self.code_ttl;

        let identity = self.store.upsert_identity_code(&email, &code, expiry).await?;
        info!("Issued verification code for identity {}", identity.id);

        self.delivery.deliver(&email, &code);
        Ok(identity)
    }

    /// Consumes the outstanding code for `email` if `candidate` matches it.
    ///
    /// Errors: `NotFound` (no identity or no code), `Expired` (code cleared as a
    /// side effect), `Mismatch` (code kept; retry allowed until expiry).
    pub async fn verify(
        &self,
        email: &str,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<IdentityRow, AppError> {
        let email = normalize_email(email)?;
        let candidate = candidate.trim();

        let identity = self
            .store
            .find_identity_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("No pending verification code".to_string()))?;

        match check_code(
            identity.verify_code.as_deref(),
            identity.verify_expiry,
            candidate,
            now,
        ) {
            CodeCheck::Missing => Err(AppError::NotFound(
                "No pending verification code".to_string(),
            )),
            CodeCheck::Expired => {
                if let Some(code) = identity.verify_code.as_deref() {
                    self.store.clear_code(identity.id, code).await?;
                }
                info!("Verification code expired for identity {}", identity.id);
                Err(AppError::Expired)
            }
            CodeCheck::Mismatch => {
                warn!("Verification code mismatch for identity {}", identity.id);
                Err(AppError::Mismatch)
            }
            CodeCheck::Valid => {
                // Conditional on the code: a concurrent verify or re-issue wins cleanly.
                let verified = self
                    .store
                    .consume_code(identity.id, candidate)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound("No pending verification code".to_string())
                    })?;
                info!("Identity {} verified", verified.id);
                Ok(verified)
            }
        }
    }
}
