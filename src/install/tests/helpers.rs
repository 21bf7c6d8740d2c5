//! Fake installer primitive and plugin host

use crate::install::error::{HostError, HostResult, InstallError, InstallResult};
use crate::install::traits::{InstallPhases, InstallReport, PackageInstaller, PluginHost};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeHost {
    active: Mutex<BTreeSet<String>>,
    activations: AtomicUsize,
    deactivations: AtomicUsize,
    refuse_activation: bool,
}

impl FakeHost {
    pub(crate) fn with_active(basename: &str) -> Self {
        let host = Self::default();
        host.active.lock().unwrap().insert(basename.to_string());
        host
    }

    pub(crate) fn refusing_activation(mut self) -> Self {
        self.refuse_activation = true;
        self
    }

    pub(crate) fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub(crate) fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }
}

impl PluginHost for FakeHost {
    fn is_active(&self, basename: &str) -> HostResult<bool> {
        Ok(self.active.lock().unwrap().contains(basename))
    }

    fn activate(&self, basename: &str) -> HostResult<()> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        if self.refuse_activation {
            return Err(HostError::Rejected {
                message: "fatal error during activation".to_string(),
            });
        }
        self.active.lock().unwrap().insert(basename.to_string());
        Ok(())
    }

    fn deactivate(&self, basename: &str) -> HostResult<()> {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        self.active.lock().unwrap().remove(basename);
        Ok(())
    }
}

/// Installer that drives the phases without touching the disk
#[derive(Default)]
pub(crate) struct FakeInstaller {
    pub(crate) refuse_connect: bool,
    pub(crate) fail_install: bool,
    pub(crate) skip_post_install: bool,
    pub(crate) runs: usize,
    pub(crate) connected: Vec<PathBuf>,
    pub(crate) packages: Vec<String>,
}

impl PackageInstaller for FakeInstaller {
    fn connect(&mut self, paths: &[PathBuf]) -> bool {
        self.connected = paths.to_vec();
        !self.refuse_connect
    }

    fn run(
        &mut self,
        package_url: &str,
        destination: &Path,
        phases: &mut dyn InstallPhases,
    ) -> InstallResult<InstallReport> {
        self.runs += 1;
        self.packages.push(package_url.to_string());

        phases.pre_install().map_err(|message| InstallError::Phase {
            phase: "pre_install",
            message,
        })?;
        if self.fail_install {
            return Err(InstallError::UnsupportedPackage {
                url: package_url.to_string(),
            });
        }
        if !self.skip_post_install {
            phases
                .post_install(destination)
                .map_err(|message| InstallError::Phase {
                    phase: "post_install",
                    message,
                })?;
        }
        Ok(InstallReport {
            destination: destination.to_path_buf(),
            backup: None,
        })
    }

    fn feedback(&self) -> Vec<String> {
        vec![format!("{} run(s)", self.runs)]
    }
}
