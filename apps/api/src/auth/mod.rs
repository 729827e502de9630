//! Sign-in: one-time email codes (ledger), their delivery, and bearer sessions (gate).

pub mod delivery;
pub mod handlers;
pub mod ledger;
pub mod session;
