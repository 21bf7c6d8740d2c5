//! Collaborator traits for the host-provided installer and plugin registry

use crate::install::error::{HostResult, InstallResult};
use std::path::{Path, PathBuf};

/// What an installer run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub destination: PathBuf,
    /// Where the previous contents were parked while installing, if anywhere
    pub backup: Option<PathBuf>,
}

/// Extension points an installer invokes during one run.
///
/// Handed to [`PackageInstaller::run`] for that call only.
pub trait InstallPhases {
    /// Before anything on disk changes
    fn pre_install(&mut self) -> Result<(), String>;

    /// Move the current destination out of the way. Returns the backup
    /// location so the installer can restore it if the install fails.
    fn clear_destination(&mut self, destination: &Path) -> Result<Option<PathBuf>, String>;

    /// After the new files are in place
    fn post_install(&mut self, destination: &Path) -> Result<(), String>;
}

/// Host installer primitive that physically replaces plugin files
pub trait PackageInstaller: Send {
    /// Make sure the given storage locations are reachable/writable
    fn connect(&mut self, paths: &[PathBuf]) -> bool;

    fn run(
        &mut self,
        package_url: &str,
        destination: &Path,
        phases: &mut dyn InstallPhases,
    ) -> InstallResult<InstallReport>;

    /// Progress lines collected during the last run
    fn feedback(&self) -> Vec<String>;
}

/// Plugin activation state, keyed by plugin basename
pub trait PluginHost: Send + Sync {
    fn is_active(&self, basename: &str) -> HostResult<bool>;
    fn activate(&self, basename: &str) -> HostResult<()>;
    fn deactivate(&self, basename: &str) -> HostResult<()>;
}
