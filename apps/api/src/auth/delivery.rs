//! Out-of-band channel for verification codes.

use tracing::info;

/// Delivers a freshly issued code to its owner. Fire-and-forget: the ledger
/// never learns whether delivery succeeded.
pub trait CodeDelivery: Send + Sync {
    fn deliver(&self, email: &str, code: &str);
}

/// Development channel: writes the code to the log under its own target.
/// This is the only place a verification code is ever logged.
pub struct ConsoleDelivery;

impl CodeDelivery for ConsoleDelivery {
    fn deliver(&self, email: &str, code: &str) {
        info!(target: "autotailor_api::code_delivery", "[DEV] Verification code for {email}: {code}");
    }
}
