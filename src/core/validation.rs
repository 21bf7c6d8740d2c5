//! Validation utilities for configuration and command-line values

use crate::core::error_handling::ContextualError;
use std::fmt;

/// A user-actionable validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Validate positive integer value
pub fn validate_positive_int(value: &str) -> Result<u64, ValidationError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ValidationError::new("Value must be greater than 0")),
        Ok(n) => Ok(n),
        Err(_) => Err(ValidationError::new(&format!(
            "'{}' is not a valid positive integer",
            value
        ))),
    }
}

/// Validate an update-server URI: absolute http(s) URL with a host
pub fn validate_update_uri(value: &str) -> Result<reqwest::Url, ValidationError> {
    let url = reqwest::Url::parse(value.trim()).map_err(|e| {
        ValidationError::new(&format!("Invalid update URI '{}': {}", value, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::new(&format!(
            "Update URI '{}' must use http or https",
            value
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::new(&format!(
            "Update URI '{}' has no host",
            value
        )));
    }

    Ok(url)
}

/// Validate a version string used as a rollback target
pub fn validate_target_version(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("Target version cannot be empty"));
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::new(&format!(
            "Target version '{}' contains whitespace or control characters",
            value
        )));
    }
    Ok(trimmed.to_string())
}
