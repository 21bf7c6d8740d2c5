//! Plugin rollback: request validation, package resolution, install, reactivation

// Internal modules - all access should go through api module
pub(crate) mod nonce;
pub(crate) mod orchestrator;
pub(crate) mod request;

// Public API module - the only public interface for rollbacks
pub mod api;

#[cfg(test)]
mod tests;
