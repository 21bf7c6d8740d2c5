//! Local directory installer
//!
//! Installs packages that are plain directories on this machine (a path or a
//! `file://` URL). Package URLs published by an update server (http, https or
//! protocol-relative) are only served from a package mirror: a local
//! directory configured by the operator, under which the URL path is looked
//! up. Without a mirror they are refused.

use crate::install::error::{InstallError, InstallResult};
use crate::install::traits::{InstallPhases, InstallReport, PackageInstaller};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct LocalInstaller {
    feedback: Vec<String>,
    mirror: Option<PathBuf>,
}

impl LocalInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installer resolving published package URLs under `mirror`
    pub fn with_mirror(mirror: impl Into<PathBuf>) -> Self {
        Self {
            feedback: Vec::new(),
            mirror: Some(mirror.into()),
        }
    }

    fn note(&mut self, line: String) {
        log::debug!("{}", line);
        self.feedback.push(line);
    }

    /// Remove whatever a failed copy left behind; false when that fails
    pub(crate) fn clear_partial(&mut self, destination: &Path) -> bool {
        if !destination.exists() {
            return true;
        }
        match std::fs::remove_dir_all(destination) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not clear partial install {:?}: {}", destination, e);
                self.note(format!("Clearing the partial install failed: {}", e));
                false
            }
        }
    }

    /// Directory a package URL names, published URLs going through the mirror
    pub fn source_for(&self, package_url: &str) -> InstallResult<PathBuf> {
        let trimmed = package_url.trim();
        let Some(url) = published_url(trimmed) else {
            return package_source(trimmed);
        };
        self.mirror
            .as_deref()
            .and_then(|mirror| mirrored_path(mirror, &url))
            .ok_or_else(|| InstallError::UnsupportedPackage {
                url: package_url.to_string(),
            })
    }
}

/// http(s) and protocol-relative URLs, as an update server publishes them
fn published_url(package_url: &str) -> Option<reqwest::Url> {
    if package_url.starts_with("//") {
        return reqwest::Url::parse(&format!("https:{}", package_url)).ok();
    }
    reqwest::Url::parse(package_url)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// URL path joined under `mirror`; any segment that could leave it is refused
fn mirrored_path(mirror: &Path, url: &reqwest::Url) -> Option<PathBuf> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return None;
    }
    let mut path = mirror.to_path_buf();
    for segment in segments {
        if segment == "." || segment == ".." || segment.contains(['%', '\\', ':']) {
            return None;
        }
        path.push(segment);
    }
    Some(path)
}

/// Filesystem path named by a local package reference
pub fn package_source(package_url: &str) -> InstallResult<PathBuf> {
    let unsupported = || InstallError::UnsupportedPackage {
        url: package_url.to_string(),
    };
    let trimmed = package_url.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") {
        return Err(unsupported());
    }
    match reqwest::Url::parse(trimmed) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|_| unsupported()),
        // Single-letter schemes are Windows drive prefixes
        Ok(url) if url.scheme().len() > 1 => Err(unsupported()),
        _ => Ok(PathBuf::from(trimmed)),
    }
}

fn copy_dir_recursive(source: &Path, destination: &Path) -> std::io::Result<usize> {
    std::fs::create_dir_all(destination)?;
    let mut copied = 0;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copied += copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

impl PackageInstaller for LocalInstaller {
    fn connect(&mut self, paths: &[PathBuf]) -> bool {
        for path in paths {
            if let Err(e) = std::fs::create_dir_all(path) {
                self.note(format!("Cannot use {}: {}", path.display(), e));
                return false;
            }
        }
        true
    }

    fn run(
        &mut self,
        package_url: &str,
        destination: &Path,
        phases: &mut dyn InstallPhases,
    ) -> InstallResult<InstallReport> {
        self.feedback.clear();

        let source = self.source_for(package_url)?;
        if !source.is_dir() {
            return Err(InstallError::MissingSource { path: source });
        }
        self.note(format!("Installing package from {}", source.display()));

        phases
            .pre_install()
            .map_err(|message| InstallError::Phase {
                phase: "pre_install",
                message,
            })?;

        let backup = phases
            .clear_destination(destination)
            .map_err(|message| InstallError::Phase {
                phase: "clear_destination",
                message,
            })?;
        if let Some(backup) = &backup {
            self.note(format!("Previous version moved to {}", backup.display()));
        }

        match copy_dir_recursive(&source, destination) {
            Ok(count) => self.note(format!("Copied {} files", count)),
            Err(source_err) => {
                let cleared = self.clear_partial(destination);
                match &backup {
                    Some(backup) if !cleared => {
                        self.note(format!("Previous version left at {}", backup.display()));
                    }
                    Some(backup) => match std::fs::rename(backup, destination) {
                        Ok(()) => self.note("Previous version restored".to_string()),
                        Err(e) => {
                            log::error!(
                                "Could not restore backup {:?} to {:?}: {}",
                                backup,
                                destination,
                                e
                            );
                            self.note(format!("Restoring the previous version failed: {}", e));
                        }
                    },
                    None => {}
                }
                return Err(InstallError::Copy {
                    destination: destination.to_path_buf(),
                    source: source_err,
                });
            }
        }

        phases
            .post_install(destination)
            .map_err(|message| InstallError::Phase {
                phase: "post_install",
                message,
            })?;

        if let Some(backup) = &backup {
            if let Err(e) = std::fs::remove_dir_all(backup) {
                log::warn!("Could not remove backup {:?}: {}", backup, e);
            }
        }
        self.note("Plugin installed successfully".to_string());

        Ok(InstallReport {
            destination: destination.to_path_buf(),
            backup,
        })
    }

    fn feedback(&self) -> Vec<String> {
        self.feedback.clone()
    }
}
