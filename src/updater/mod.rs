//! Update checking: descriptor, remote metadata, reconciliation, decision

// Internal modules - all access should go through api module
pub(crate) mod cache;
pub(crate) mod checker;
pub(crate) mod decision;
pub(crate) mod descriptor;
pub(crate) mod error;
pub(crate) mod fetcher;
pub(crate) mod payload;
pub(crate) mod reconciler;
pub(crate) mod record;
pub(crate) mod sanitize;
pub(crate) mod session;
pub(crate) mod version;

// Public API module - the only public interface for update checking
pub mod api;

#[cfg(test)]
pub(crate) mod tests;
