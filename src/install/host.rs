//! File-backed plugin activation state
//!
//! The active plugin list lives in `<site_dir>/active_plugins.json` as a
//! sorted JSON array of basenames.

use crate::install::error::{HostError, HostResult};
use crate::install::traits::PluginHost;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const ACTIVE_PLUGINS_FILE: &str = "active_plugins.json";

#[derive(Debug, Clone)]
pub struct JsonPluginHost {
    state_file: PathBuf,
    plugins_dir: PathBuf,
}

impl JsonPluginHost {
    pub fn new(site_dir: &Path, plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_file: site_dir.join(ACTIVE_PLUGINS_FILE),
            plugins_dir: plugins_dir.into(),
        }
    }

    pub fn active_plugins(&self) -> HostResult<BTreeSet<String>> {
        let text = match std::fs::read_to_string(&self.state_file) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(source) => {
                return Err(HostError::Io {
                    path: self.state_file.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|e| HostError::Corrupt {
            path: self.state_file.clone(),
            cause: e.to_string(),
        })
    }

    fn store(&self, active: &BTreeSet<String>) -> HostResult<()> {
        let io_error = |source| HostError::Io {
            path: self.state_file.clone(),
            source,
        };
        if let Some(parent) = self.state_file.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let text = serde_json::to_string_pretty(active).map_err(|e| HostError::Corrupt {
            path: self.state_file.clone(),
            cause: e.to_string(),
        })?;
        std::fs::write(&self.state_file, text).map_err(io_error)
    }
}

impl PluginHost for JsonPluginHost {
    fn is_active(&self, basename: &str) -> HostResult<bool> {
        Ok(self.active_plugins()?.contains(basename))
    }

    fn activate(&self, basename: &str) -> HostResult<()> {
        let main_file = self.plugins_dir.join(basename);
        if !main_file.is_file() {
            return Err(HostError::MissingPluginFile {
                basename: basename.to_string(),
                path: main_file,
            });
        }
        let mut active = self.active_plugins()?;
        if active.insert(basename.to_string()) {
            self.store(&active)?;
        }
        Ok(())
    }

    fn deactivate(&self, basename: &str) -> HostResult<()> {
        let mut active = self.active_plugins()?;
        if active.remove(basename) {
            self.store(&active)?;
        }
        Ok(())
    }
}
