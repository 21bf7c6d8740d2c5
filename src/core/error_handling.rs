//! Generic error handling utilities
//!
//! Provides unified error reporting that works across the updater's error
//! types while keeping user-facing output short.

/// Errors that can tell user-actionable failures apart from system failures
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// True for errors the operator can fix directly (bad config, missing
    /// plugin header, rejected nonce). False for I/O and network failures.
    fn is_user_actionable(&self) -> bool;

    /// The message to show the operator for user-actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Log an error with a detail level that depends on how actionable it is
///
/// User-actionable errors log their own message; system errors log the
/// operation context. The full error is always available at debug level.
///
/// # Examples
/// ```rust,no_run
/// # use plugin_updater::core::error_handling::log_error_with_context;
/// # use plugin_updater::core::validation::ValidationError;
/// let err = ValidationError::new("plugin-file is required");
/// log_error_with_context(&err, "Loading configuration");
/// // Logs: "FATAL: plugin-file is required"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
