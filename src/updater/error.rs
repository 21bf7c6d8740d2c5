//! Update-check Error Types

use crate::core::error_handling::ContextualError;
use std::path::PathBuf;

/// Failure of the remote metadata fetch.
///
/// Always downgraded to "no update available" by the update checker; only
/// the rollback orchestrator turns it into a user-facing error code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchFailure {
    #[error("Plugin '{slug}' does not declare an Update URI")]
    MissingUpdateUri { slug: String },

    #[error("Invalid update URI '{uri}': {cause}")]
    InvalidUpdateUri { uri: String, cause: String },

    #[error("Could not create HTTP client: {cause}")]
    Client { cause: String },

    #[error("Request to {url} failed: {cause}")]
    Transport { url: String, cause: String },

    #[error("Update server {url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Update server {url} returned an unusable payload: {cause}")]
    Decode { url: String, cause: String },
}

impl FetchFailure {
    /// Error taxonomy code for logs and diagnostics
    pub fn code(&self) -> &'static str {
        "transport_failure"
    }
}

/// Failure reading the local plugin header
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Failed to read plugin file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Plugin file {path:?} has no 'Plugin Name' header")]
    MissingHeader { path: PathBuf },

    #[error("Plugin file {path:?} is not inside the plugins directory {plugins_dir:?}")]
    OutsidePluginsDir { path: PathBuf, plugins_dir: PathBuf },
}

impl ContextualError for DescriptorError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, DescriptorError::Io { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            DescriptorError::Io { .. } => None,
            DescriptorError::MissingHeader { .. } => {
                Some("The plugin file has no 'Plugin Name' header")
            }
            DescriptorError::OutsidePluginsDir { .. } => {
                Some("The plugin file must live inside the plugins directory")
            }
        }
    }
}

/// Failure of the update-availability cache
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache entry {path:?} could not be encoded: {cause}")]
    Encode { path: PathBuf, cause: String },

    #[error("Cache state unavailable: {message}")]
    Lock { message: String },
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by the update checker's interactive actions
#[derive(Debug, thiserror::Error)]
pub enum UpdaterError {
    #[error("You do not have permission to manage plugin updates")]
    Forbidden,

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ContextualError for UpdaterError {
    fn is_user_actionable(&self) -> bool {
        match self {
            UpdaterError::Forbidden => true,
            UpdaterError::Descriptor(err) => err.is_user_actionable(),
            UpdaterError::Cache(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            UpdaterError::Forbidden => Some("You do not have permission to manage plugin updates"),
            UpdaterError::Descriptor(err) => err.user_message(),
            UpdaterError::Cache(_) => None,
        }
    }
}

pub type UpdaterResult<T> = Result<T, UpdaterError>;
