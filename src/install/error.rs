//! Install and plugin-host error types

use crate::core::error_handling::ContextualError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Could not connect to plugin storage at {paths:?}")]
    Connect { paths: Vec<PathBuf> },

    #[error("Single-file plugin '{basename}' cannot be replaced by a package install")]
    SingleFilePlugin { basename: String },

    #[error("Package '{url}' cannot be installed by this installer")]
    UnsupportedPackage { url: String },

    #[error("Package source {path:?} is not a directory")]
    MissingSource { path: PathBuf },

    #[error("Install phase '{phase}' failed: {message}")]
    Phase { phase: &'static str, message: String },

    #[error("Copying package into {destination:?} failed: {source}")]
    Copy {
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContextualError for InstallError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            InstallError::SingleFilePlugin { .. }
                | InstallError::UnsupportedPackage { .. }
                | InstallError::MissingSource { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            InstallError::SingleFilePlugin { .. } => {
                Some("Only plugins installed in their own directory can be rolled back")
            }
            InstallError::UnsupportedPackage { .. } => {
                Some("The package URL is not supported by the local installer")
            }
            InstallError::MissingSource { .. } => Some("The package directory does not exist"),
            _ => None,
        }
    }
}

pub type InstallResult<T> = Result<T, InstallError>;

/// Failure reading or changing plugin activation state
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Plugin file for '{basename}' not found at {path:?}")]
    MissingPluginFile { basename: String, path: PathBuf },

    #[error("Activation state I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Activation state {path:?} is not valid JSON: {cause}")]
    Corrupt { path: PathBuf, cause: String },

    #[error("Plugin host rejected the request: {message}")]
    Rejected { message: String },
}

pub type HostResult<T> = Result<T, HostError>;
