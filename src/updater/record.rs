//! Canonical update record produced by the reconciler

use crate::updater::payload::{non_negative_int, scalar_text};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Version catalog key that always points at the current package
pub const TRUNK: &str = "trunk";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    pub src: String,
    pub caption: String,
}

/// Typed, reconciled view of the update server's metadata.
///
/// Invariants (enforced by [`CanonicalUpdateRecord::enforce_invariants`]):
/// no `package_url` means an empty `versions` catalog, and a set
/// `package_url` is always reachable through `versions["trunk"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalUpdateRecord {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub new_version: Option<String>,
    pub package_url: Option<String>,
    pub download_link: Option<String>,
    pub versions: BTreeMap<String, String>,
    pub allow_rollback: bool,
    pub business_model: bool,
    pub tested: Option<String>,
    pub requires: Option<String>,
    pub requires_php: Option<String>,
    pub author: Option<String>,
    pub author_profile: Option<String>,
    pub homepage: Option<String>,
    pub last_updated: Option<String>,
    pub sections: BTreeMap<String, String>,
    pub screenshots: BTreeMap<u32, Screenshot>,
    pub banners: BTreeMap<String, String>,
    pub icons: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub rating: u64,
    pub num_ratings: u64,
    pub active_installs: u64,
    pub support_threads: u64,
    pub support_threads_resolved: u64,
    pub downloaded: u64,
}

impl CanonicalUpdateRecord {
    /// Build the typed record from a merged canonical map.
    ///
    /// Lenient: values of the wrong shape are skipped rather than rejected.
    pub(crate) fn from_canonical_map(map: &Map<String, Value>) -> Self {
        let text = |key: &str| map.get(key).and_then(scalar_text);
        let count = |key: &str| map.get(key).map(non_negative_int).unwrap_or(0);

        let mut record = Self {
            name: text("name"),
            slug: text("slug"),
            new_version: text("new_version"),
            package_url: text("package_url"),
            download_link: text("download_link"),
            versions: string_map(map.get("versions")),
            allow_rollback: false,
            business_model: false,
            tested: text("tested"),
            requires: text("requires"),
            requires_php: text("requires_php"),
            author: text("author"),
            author_profile: text("author_profile"),
            homepage: text("homepage"),
            last_updated: text("last_updated"),
            sections: string_map(map.get("sections")),
            screenshots: screenshot_map(map.get("screenshots")),
            banners: string_map(map.get("banners")),
            icons: string_map(map.get("icons")),
            tags: string_map(map.get("tags")),
            rating: count("rating"),
            num_ratings: count("num_ratings"),
            active_installs: count("active_installs"),
            support_threads: count("support_threads"),
            support_threads_resolved: count("support_threads_resolved"),
            downloaded: count("downloaded"),
        };
        record.enforce_invariants();
        record
    }

    /// No package, no catalog; a package is always the trunk entry
    pub fn enforce_invariants(&mut self) {
        match &self.package_url {
            Some(package) => {
                self.versions.insert(TRUNK.to_string(), package.clone());
                if self.download_link.is_none() {
                    self.download_link = Some(package.clone());
                }
            }
            None => self.versions.clear(),
        }
    }

    /// Published versions (without `trunk`), newest first
    pub fn published_versions(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .versions
            .iter()
            .filter(|(version, _)| version.as_str() != TRUNK)
            .map(|(version, url)| (version.as_str(), url.as_str()))
            .collect();
        entries.sort_by(|a, b| crate::updater::version::compare_versions(b.0, a.0));
        entries
    }
}

fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    match value {
        Some(Value::Object(entries)) => entries
            .iter()
            .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn screenshot_map(value: Option<&Value>) -> BTreeMap<u32, Screenshot> {
    let Some(Value::Object(entries)) = value else {
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|(key, value)| {
            let index = key.parse::<u32>().ok()?;
            let shot: Screenshot = serde_json::from_value(value.clone()).ok()?;
            Some((index, shot))
        })
        .collect()
}
