//! Install pipeline adapter
//!
//! Wraps a [`PackageInstaller`] run with the phase callbacks a plugin
//! replacement needs: remember whether the plugin was active, deactivate it,
//! park the old files in a backup directory, and bring the plugin back up
//! afterwards. The callbacks are handed to the installer for this one call.

use crate::install::error::{InstallError, InstallResult};
use crate::install::traits::{InstallPhases, InstallReport, PackageInstaller, PluginHost};
use crate::updater::api::PluginDescriptor;
use std::path::{Path, PathBuf};

const BACKUP_DIR: &str = "upgrade-temp-backup";

/// Result of trying to bring the plugin back up after an install
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reactivation {
    /// The plugin was not active before the install
    NotNeeded,
    Reactivated,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub was_active: bool,
    pub reactivation: Reactivation,
    pub report: InstallReport,
}

pub struct InstallPipeline<'a> {
    host: &'a dyn PluginHost,
    plugins_dir: PathBuf,
    backup_root: PathBuf,
}

impl<'a> InstallPipeline<'a> {
    pub fn new(host: &'a dyn PluginHost, plugins_dir: impl Into<PathBuf>) -> Self {
        let plugins_dir = plugins_dir.into();
        let backup_root = backup_root_for(&plugins_dir);
        Self {
            host,
            plugins_dir,
            backup_root,
        }
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    pub fn destination_for(&self, descriptor: &PluginDescriptor) -> PathBuf {
        self.plugins_dir.join(&descriptor.slug)
    }

    /// Replace the plugin's files with `package_url`.
    ///
    /// An `Err` means nothing was reactivated; the plugin stays deactivated
    /// if it had already been deactivated by the time the install failed.
    pub fn install(
        &self,
        descriptor: &PluginDescriptor,
        package_url: &str,
        installer: &mut dyn PackageInstaller,
    ) -> InstallResult<PipelineOutcome> {
        if !descriptor.is_directory_plugin() {
            return Err(InstallError::SingleFilePlugin {
                basename: descriptor.basename.clone(),
            });
        }

        let storage = vec![self.plugins_dir.clone(), self.backup_root.clone()];
        if !installer.connect(&storage) {
            return Err(InstallError::Connect { paths: storage });
        }

        let destination = self.destination_for(descriptor);
        let mut phases = RollbackPhases {
            host: self.host,
            basename: &descriptor.basename,
            backup_dir: self.backup_root.join(&descriptor.slug),
            was_active: false,
            reactivation: None,
        };

        log::debug!("Installing {} into {:?}", package_url, destination);
        let report = installer.run(package_url, &destination, &mut phases)?;

        let reactivation = match (phases.was_active, phases.reactivation.take()) {
            (false, _) => Reactivation::NotNeeded,
            (true, Some(done)) => done,
            // The installer skipped post_install; do it here instead
            (true, None) => phases.reactivate(),
        };

        Ok(PipelineOutcome {
            was_active: phases.was_active,
            reactivation,
            report,
        })
    }
}

/// `<plugins_dir>/../upgrade-temp-backup/plugins`
pub fn backup_root_for(plugins_dir: &Path) -> PathBuf {
    plugins_dir
        .parent()
        .unwrap_or(plugins_dir)
        .join(BACKUP_DIR)
        .join("plugins")
}

struct RollbackPhases<'a> {
    host: &'a dyn PluginHost,
    basename: &'a str,
    backup_dir: PathBuf,
    was_active: bool,
    reactivation: Option<Reactivation>,
}

impl RollbackPhases<'_> {
    fn reactivate(&mut self) -> Reactivation {
        let outcome = match self.host.activate(self.basename) {
            Ok(()) => {
                log::info!("Reactivated '{}'", self.basename);
                Reactivation::Reactivated
            }
            Err(e) => {
                log::warn!("Could not reactivate '{}': {}", self.basename, e);
                Reactivation::Failed(e.to_string())
            }
        };
        self.reactivation = Some(outcome.clone());
        outcome
    }
}

impl InstallPhases for RollbackPhases<'_> {
    fn pre_install(&mut self) -> Result<(), String> {
        self.was_active = self
            .host
            .is_active(self.basename)
            .map_err(|e| e.to_string())?;
        if self.was_active {
            self.host
                .deactivate(self.basename)
                .map_err(|e| e.to_string())?;
            log::debug!("Deactivated '{}' for install", self.basename);
        }
        Ok(())
    }

    fn clear_destination(&mut self, destination: &Path) -> Result<Option<PathBuf>, String> {
        if !destination.exists() {
            return Ok(None);
        }
        if self.backup_dir.exists() {
            std::fs::remove_dir_all(&self.backup_dir)
                .map_err(|e| format!("removing stale backup {:?}: {}", self.backup_dir, e))?;
        }
        if let Some(parent) = self.backup_dir.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("creating backup root {:?}: {}", parent, e))?;
        }
        std::fs::rename(destination, &self.backup_dir).map_err(|e| {
            format!(
                "moving {:?} to backup {:?}: {}",
                destination, self.backup_dir, e
            )
        })?;
        Ok(Some(self.backup_dir.clone()))
    }

    fn post_install(&mut self, _destination: &Path) -> Result<(), String> {
        if self.was_active && self.reactivation.is_none() {
            self.reactivate();
        }
        // A failed reactivation is reported by the pipeline, not the installer
        Ok(())
    }
}
