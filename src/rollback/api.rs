//! Public API for plugin rollbacks

pub use crate::rollback::nonce::{
    rollback_nonce_action, NonceVerifier, TickNonce, DEFAULT_NONCE_LIFETIME_SECS,
};
pub use crate::rollback::orchestrator::{RollbackOptions, RollbackOrchestrator, RollbackState};
pub use crate::rollback::request::{RollbackErrorCode, RollbackRequest, RollbackResult};
