//! Metadata reconciler
//!
//! Turns the untyped server payload into a [`CanonicalUpdateRecord`]. Each
//! field rule is applied independently: a key missing from the payload leaves
//! the canonical field to the projection defaults. The remote side always
//! wins over defaults, and nested maps (`sections`, `icons`, ...) are merged
//! key by key.

use crate::core::strings::{escape_html, sanitize_text_field, sanitize_url};
use crate::updater::descriptor::PluginDescriptor;
use crate::updater::payload::{scalar_text, RawRemotePayload};
use crate::updater::record::{CanonicalUpdateRecord, Screenshot, TRUNK};
use crate::updater::sanitize::sanitize_html;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Payload fields that become `sections.<name>`
const SECTION_FIELDS: &[&str] = &[
    "description",
    "installation",
    "faq",
    "changelog",
    "screenshots",
];

/// Plain-text fields copied under the same canonical name
const TEXT_FIELDS: &[&str] = &[
    "name",
    "slug",
    "tested",
    "requires",
    "requires_php",
    "last_updated",
];

const COUNT_FIELDS: &[&str] = &[
    "rating",
    "num_ratings",
    "active_installs",
    "support_threads",
    "support_threads_resolved",
    "downloaded",
];

/// Canonical-keyed values a projection falls back to when the server omits them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileDefaults(Map<String, Value>);

impl ReconcileDefaults {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_values(self) -> Map<String, Value> {
        self.0
    }
}

/// Reconcile a raw payload into a canonical record. Pure: no I/O, no
/// mutation of the inputs.
pub fn reconcile(
    raw: &RawRemotePayload,
    descriptor: &PluginDescriptor,
    defaults: &ReconcileDefaults,
) -> CanonicalUpdateRecord {
    let remote = normalize(raw);

    let mut merged = defaults.values().clone();
    deep_merge(&mut merged, &remote);

    let mut record = CanonicalUpdateRecord::from_canonical_map(&merged);

    // Rollback permission comes from the server's own flags only
    record.allow_rollback = raw.flag("allow_rollback").unwrap_or(false);
    record.business_model = raw.flag("business_model").unwrap_or(false);

    if record.slug.is_none() {
        record.slug = Some(descriptor.slug.clone());
    }
    record.enforce_invariants();

    log::debug!(
        "Reconciled metadata for '{}': new_version={:?} package={} versions={} rollback={}",
        descriptor.slug,
        record.new_version,
        record.package_url.is_some(),
        record.versions.len(),
        record.allow_rollback
    );

    record
}

/// Overlay `overlay` onto `base`; objects merge recursively, everything else
/// is replaced.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Map payload keys onto canonical keys, only for keys the payload carries
fn normalize(raw: &RawRemotePayload) -> Map<String, Value> {
    let mut canonical = Map::new();

    if let Some(version) = raw.text("new_version").or_else(|| raw.text("version")) {
        canonical.insert("new_version".into(), json!(sanitize_text_field(&version)));
    }

    for field in TEXT_FIELDS {
        if let Some(value) = raw.text(field) {
            canonical.insert((*field).into(), json!(sanitize_text_field(&value)));
        }
    }

    if let Some(homepage) = raw.text("homepage").map(|url| sanitize_url(&url)) {
        if !homepage.is_empty() {
            canonical.insert("homepage".into(), json!(homepage));
        }
    }

    normalize_package(raw, &mut canonical);
    normalize_author(raw, &mut canonical);

    let sections = normalize_sections(raw, &mut canonical);
    if !sections.is_empty() {
        canonical.insert("sections".into(), Value::Object(sections));
    }

    for field in ["banners", "icons"] {
        let urls = url_map(raw.get(field));
        if !urls.is_empty() {
            canonical.insert(field.into(), Value::Object(urls));
        }
    }

    let tags = tag_map(raw.get("tags"));
    if !tags.is_empty() {
        canonical.insert("tags".into(), Value::Object(tags));
    }

    for field in COUNT_FIELDS {
        if let Some(count) = raw.count(field) {
            canonical.insert((*field).into(), json!(count));
        }
    }

    canonical
}

fn normalize_package(raw: &RawRemotePayload, canonical: &mut Map<String, Value>) {
    let package = raw
        .text("download_link")
        .or_else(|| raw.text("package"))
        .map(|url| sanitize_url(&url))
        .filter(|url| !url.is_empty());

    let Some(package) = package else {
        // No resolvable package: never advertise a catalog
        canonical.insert("versions".into(), Value::Object(Map::new()));
        return;
    };

    let mut versions = url_map(raw.get("versions"));
    versions.insert(TRUNK.into(), json!(package));

    canonical.insert("package_url".into(), json!(package));
    canonical.insert("download_link".into(), json!(package));
    canonical.insert("versions".into(), Value::Object(versions));
}

fn normalize_author(raw: &RawRemotePayload, canonical: &mut Map<String, Value>) {
    let author = raw.text("author").map(|a| sanitize_text_field(&a));
    let profile = raw
        .text("author_profile")
        .map(|url| sanitize_url(&url))
        .filter(|url| !url.is_empty());

    if let Some(profile) = &profile {
        canonical.insert("author_profile".into(), json!(profile));
    }

    match (author, profile) {
        (Some(author), Some(profile)) => {
            let link = format!(
                "<a href=\"{}\">{}</a>",
                escape_html(&profile),
                escape_html(&author)
            );
            canonical.insert("author".into(), json!(link));
        }
        (Some(author), None) => {
            canonical.insert("author".into(), json!(author));
        }
        _ => {}
    }
}

fn normalize_sections(
    raw: &RawRemotePayload,
    canonical: &mut Map<String, Value>,
) -> Map<String, Value> {
    let mut sections = Map::new();

    // A ready-made sections object is accepted; top-level fields override it
    if let Some(Value::Object(provided)) = raw.get("sections") {
        for (name, value) in provided {
            if let Some(html) = scalar_text(value) {
                sections.insert(name.clone(), json!(sanitize_html(&html)));
            }
        }
    }

    for field in SECTION_FIELDS {
        let Some(value) = raw.get(field) else {
            continue;
        };
        if *field == "screenshots" && !value.is_string() {
            let shots = screenshot_list(value);
            if !shots.is_empty() {
                sections.insert("screenshots".into(), json!(screenshot_gallery(&shots)));
                canonical.insert(
                    "screenshots".into(),
                    serde_json::to_value(&shots).unwrap_or(Value::Null),
                );
            }
            continue;
        }
        if let Some(html) = scalar_text(value) {
            sections.insert((*field).into(), json!(sanitize_html(&html)));
        }
    }

    sections
}

/// 1-indexed screenshot list from an array or a keyed object of either
/// `{src, caption}` objects or bare URLs
fn screenshot_list(value: &Value) -> BTreeMap<u32, Screenshot> {
    let entries: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(items) => {
            let mut keyed: Vec<(&String, &Value)> = items.iter().collect();
            keyed.sort_by_key(|(key, _)| key.parse::<u32>().unwrap_or(u32::MAX));
            keyed.into_iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let (src, caption) = match entry {
                Value::Object(fields) => (
                    fields.get("src").and_then(scalar_text)?,
                    fields
                        .get("caption")
                        .and_then(scalar_text)
                        .unwrap_or_default(),
                ),
                other => (scalar_text(other)?, String::new()),
            };
            let src = sanitize_url(&src);
            if src.is_empty() {
                return None;
            }
            Some(Screenshot {
                src,
                caption: sanitize_text_field(&caption),
            })
        })
        .zip(1u32..)
        .map(|(shot, index)| (index, shot))
        .collect()
}

fn screenshot_gallery(shots: &BTreeMap<u32, Screenshot>) -> String {
    let mut html = String::from("<ol>");
    for shot in shots.values() {
        let src = escape_html(&shot.src);
        let caption = escape_html(&shot.caption);
        html.push_str(&format!(
            "<li><a href=\"{src}\"><img src=\"{src}\" alt=\"{caption}\"></a>"
        ));
        if !caption.is_empty() {
            html.push_str(&format!("<p>{caption}</p>"));
        }
        html.push_str("</li>");
    }
    html.push_str("</ol>");
    html
}

fn url_map(value: Option<&Value>) -> Map<String, Value> {
    let Some(Value::Object(entries)) = value else {
        return Map::new();
    };
    entries
        .iter()
        .filter_map(|(key, value)| {
            let url = sanitize_url(&scalar_text(value)?);
            let key = sanitize_text_field(key);
            (!url.is_empty() && !key.is_empty()).then(|| (key, json!(url)))
        })
        .collect()
}

fn tag_map(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .map(|name| sanitize_text_field(&name))
            .filter(|name| !name.is_empty())
            .map(|name| (name.to_lowercase().replace(' ', "-"), json!(name)))
            .collect(),
        Some(Value::Object(items)) => items
            .iter()
            .filter_map(|(slug, name)| {
                let name = sanitize_text_field(&scalar_text(name)?);
                (!name.is_empty()).then(|| (sanitize_text_field(slug), json!(name)))
            })
            .collect(),
        _ => Map::new(),
    }
}
