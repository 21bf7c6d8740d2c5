//! Common test utilities and helpers
//!
//! A throwaway site with one installed plugin, local package directories
//! and a canned update server.

#![allow(dead_code)]

use async_trait::async_trait;
use plugin_updater::install::api::LocalInstaller;
use plugin_updater::updater::api::{
    FetchAction, FetchFailure, MetadataFetcher, RawRemotePayload, UpdateSession,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const SLUG: &str = "acme-forms";
pub const BASENAME: &str = "acme-forms/acme-forms.php";

pub fn plugin_source(version: &str) -> String {
    format!(
        "<?php\n/**\n * Plugin Name: Acme Forms\n * Version: {}\n * Update URI: https://updates.acme.test/api\n * Description: Forms for everyone.\n */\n",
        version
    )
}

pub struct TestSite {
    pub root: TempDir,
}

impl TestSite {
    /// Site with version `installed` of the plugin under `plugins/`
    pub fn new(installed: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let site = Self { root };
        let plugin_dir = site.plugins_dir().join(SLUG);
        std::fs::create_dir_all(&plugin_dir).unwrap();
        std::fs::write(plugin_dir.join("acme-forms.php"), plugin_source(installed)).unwrap();
        std::fs::write(plugin_dir.join("CHANGELOG.md"), format!("= {} =\n", installed)).unwrap();
        site
    }

    pub fn dir(&self) -> &Path {
        self.root.path()
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.dir().join("plugins")
    }

    pub fn plugin_file(&self) -> PathBuf {
        self.plugins_dir().join(BASENAME)
    }

    /// URL the update server publishes the `version` package under
    pub fn package_url(version: &str) -> String {
        format!("https://updates.acme.test/packages/{}/{}", version, SLUG)
    }

    /// Publish a package directory for `version` in the site's mirror;
    /// returns its published URL
    pub fn publish(&self, version: &str) -> String {
        let package = self.dir().join("packages").join(version).join(SLUG);
        std::fs::create_dir_all(package.join("assets")).unwrap();
        std::fs::write(package.join("acme-forms.php"), plugin_source(version)).unwrap();
        std::fs::write(package.join("assets").join("forms.css"), "form{}").unwrap();
        Self::package_url(version)
    }

    /// Installer reading published packages from the site's mirror
    pub fn installer(&self) -> LocalInstaller {
        LocalInstaller::with_mirror(self.dir())
    }

    pub fn installed_header(&self) -> String {
        std::fs::read_to_string(self.plugin_file()).unwrap()
    }
}

/// Update server answering every request with the same body
pub struct CannedServer {
    body: Value,
    calls: AtomicUsize,
}

impl CannedServer {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            calls: AtomicUsize::new(0),
        }
    }

    /// Catalog offering `latest` plus the given rollback targets
    pub fn catalog(latest_url: &str, versions: &[(&str, &str)]) -> Self {
        let versions: serde_json::Map<String, Value> = versions
            .iter()
            .map(|(version, url)| (version.to_string(), json!(url)))
            .collect();
        Self::new(json!({
            "new_version": "2.1.0",
            "download_link": latest_url,
            "versions": versions,
            "allow_rollback": "yes",
            "sections": {"changelog": "<p>Fixes</p>"}
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataFetcher for CannedServer {
    async fn fetch(
        &self,
        _session: &UpdateSession,
        _action: FetchAction,
    ) -> Result<RawRemotePayload, FetchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        RawRemotePayload::from_value(self.body.clone()).ok_or_else(|| FetchFailure::Decode {
            url: "https://updates.acme.test/api".to_string(),
            cause: "not an object".to_string(),
        })
    }
}
