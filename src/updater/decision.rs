//! Update decision and plugin-details projections of the canonical record

use crate::updater::descriptor::PluginDescriptor;
use crate::updater::reconciler::ReconcileDefaults;
use crate::updater::record::{CanonicalUpdateRecord, Screenshot};
use crate::updater::version::is_newer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// What the host's update list shows for an available update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOffer {
    pub slug: String,
    pub plugin: String,
    pub new_version: String,
    pub current_version: String,
    pub package: Option<String>,
    pub url: Option<String>,
    pub tested: Option<String>,
    pub requires: Option<String>,
    pub requires_php: Option<String>,
    pub icons: BTreeMap<String, String>,
    pub banners: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoUpdateReason {
    /// The update server could not be reached or answered garbage
    FetchFailed,
    /// The server did not name any version
    NoNewVersion,
    /// The offered version is not newer than the installed one
    UpToDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoUpdate {
    pub reason: NoUpdateReason,
    pub current_version: String,
    pub offered_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateDecision {
    UpdateAvailable(UpdateOffer),
    NoUpdate(NoUpdate),
}

impl UpdateDecision {
    pub fn fetch_failed(descriptor: &PluginDescriptor) -> Self {
        UpdateDecision::NoUpdate(NoUpdate {
            reason: NoUpdateReason::FetchFailed,
            current_version: descriptor.version.clone(),
            offered_version: None,
        })
    }

    pub fn is_update_available(&self) -> bool {
        matches!(self, UpdateDecision::UpdateAvailable(_))
    }
}

/// Details-view projection; always populated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub slug: String,
    pub version: String,
    pub author: Option<String>,
    pub author_profile: Option<String>,
    pub homepage: Option<String>,
    pub requires: Option<String>,
    pub tested: Option<String>,
    pub requires_php: Option<String>,
    pub last_updated: Option<String>,
    pub download_link: Option<String>,
    pub allow_rollback: bool,
    pub sections: BTreeMap<String, String>,
    pub screenshots: BTreeMap<u32, Screenshot>,
    pub banners: BTreeMap<String, String>,
    pub icons: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub versions: BTreeMap<String, String>,
    pub rating: u64,
    pub num_ratings: u64,
    pub active_installs: u64,
    pub support_threads: u64,
    pub support_threads_resolved: u64,
    pub downloaded: u64,
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), json!(value));
    }
}

/// Defaults describing the installed state, for the update projection.
/// Carries no `new_version`; only the server offers one.
pub fn update_defaults(descriptor: &PluginDescriptor) -> ReconcileDefaults {
    let mut values = Map::new();
    values.insert("name".into(), json!(descriptor.name));
    values.insert("slug".into(), json!(descriptor.slug));
    insert_opt(&mut values, "tested", &descriptor.tested_up_to);
    insert_opt(&mut values, "requires", &descriptor.requires_wp);
    insert_opt(&mut values, "requires_php", &descriptor.requires_php);
    insert_opt(&mut values, "homepage", &descriptor.plugin_uri);
    ReconcileDefaults::new(values)
}

/// Defaults carrying the plugin's own descriptive metadata, for the details projection
pub fn info_defaults(descriptor: &PluginDescriptor) -> ReconcileDefaults {
    let mut values = update_defaults(descriptor).into_values();
    insert_opt(&mut values, "author", &descriptor.author);
    insert_opt(&mut values, "author_profile", &descriptor.author_uri);
    if let Some(description) = &descriptor.description {
        values.insert("sections".into(), json!({ "description": description }));
    }
    ReconcileDefaults::new(values)
}

/// Decide whether the record offers something newer than what is installed
pub fn decide_update(record: &CanonicalUpdateRecord, descriptor: &PluginDescriptor) -> UpdateDecision {
    let Some(new_version) = record.new_version.clone() else {
        return UpdateDecision::NoUpdate(NoUpdate {
            reason: NoUpdateReason::NoNewVersion,
            current_version: descriptor.version.clone(),
            offered_version: None,
        });
    };

    if !is_newer(&new_version, &descriptor.version) {
        return UpdateDecision::NoUpdate(NoUpdate {
            reason: NoUpdateReason::UpToDate,
            current_version: descriptor.version.clone(),
            offered_version: Some(new_version),
        });
    }

    log::info!(
        "Update available for '{}': {} -> {}",
        descriptor.slug,
        descriptor.version,
        new_version
    );

    UpdateDecision::UpdateAvailable(UpdateOffer {
        slug: descriptor.slug.clone(),
        plugin: descriptor.basename.clone(),
        new_version,
        current_version: descriptor.version.clone(),
        package: record.package_url.clone(),
        url: record.homepage.clone(),
        tested: record.tested.clone(),
        requires: record.requires.clone(),
        requires_php: record.requires_php.clone(),
        icons: record.icons.clone(),
        banners: record.banners.clone(),
    })
}

/// Project the record for the details view. The version catalog is only
/// exposed when the server allows rollback.
pub fn build_info(record: &CanonicalUpdateRecord, descriptor: &PluginDescriptor) -> PluginInfo {
    let versions = if record.allow_rollback {
        record.versions.clone()
    } else {
        BTreeMap::new()
    };

    PluginInfo {
        name: record.name.clone().unwrap_or_else(|| descriptor.name.clone()),
        slug: record.slug.clone().unwrap_or_else(|| descriptor.slug.clone()),
        version: record
            .new_version
            .clone()
            .unwrap_or_else(|| descriptor.version.clone()),
        author: record.author.clone(),
        author_profile: record.author_profile.clone(),
        homepage: record.homepage.clone(),
        requires: record.requires.clone(),
        tested: record.tested.clone(),
        requires_php: record.requires_php.clone(),
        last_updated: record.last_updated.clone(),
        download_link: record.download_link.clone(),
        allow_rollback: record.allow_rollback,
        sections: record.sections.clone(),
        screenshots: record.screenshots.clone(),
        banners: record.banners.clone(),
        icons: record.icons.clone(),
        tags: record.tags.clone(),
        versions,
        rating: record.rating,
        num_ratings: record.num_ratings,
        active_installs: record.active_installs,
        support_threads: record.support_threads,
        support_threads_resolved: record.support_threads_resolved,
        downloaded: record.downloaded,
    }
}
