//! Plugin package installation behind the host installer primitive

// Internal modules - all access should go through api module
pub(crate) mod error;
pub(crate) mod host;
pub(crate) mod local;
pub(crate) mod pipeline;
pub(crate) mod traits;

// Public API module - the only public interface for installation
pub mod api;

#[cfg(test)]
pub(crate) mod tests;
