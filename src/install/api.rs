//! Public API for plugin installation

pub use crate::install::error::{HostError, HostResult, InstallError, InstallResult};
pub use crate::install::host::{JsonPluginHost, ACTIVE_PLUGINS_FILE};
pub use crate::install::local::{package_source, LocalInstaller};
pub use crate::install::pipeline::{
    backup_root_for, InstallPipeline, PipelineOutcome, Reactivation,
};
pub use crate::install::traits::{InstallPhases, InstallReport, PackageInstaller, PluginHost};
