//! Local plugin header reader
//!
//! Plugins declare their identity in a comment block at the top of the main
//! plugin file (`Plugin Name: ...`, `Version: ...`, `Update URI: ...`). Only
//! the first 8 KiB of the file are inspected.

use crate::updater::error::DescriptorError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

const HEADER_READ_LIMIT: u64 = 8 * 1024;

/// Header names and the descriptor field each one feeds
const HEADERS: &[(&str, &str)] = &[
    ("name", "Plugin Name"),
    ("plugin_uri", "Plugin URI"),
    ("version", "Version"),
    ("description", "Description"),
    ("author", "Author"),
    ("author_uri", "Author URI"),
    ("update_uri", "Update URI"),
    ("requires_wp", "Requires at least"),
    ("tested_up_to", "Tested up to"),
    ("requires_php", "Requires PHP"),
];

static HEADER_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    HEADERS
        .iter()
        .map(|(field, header)| {
            let pattern = format!(r"(?mi)^[ \t/*#@]*{}:(.*)$", regex::escape(header));
            (*field, Regex::new(&pattern).unwrap())
        })
        .collect()
});

static COMMENT_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*(?:\*/|\?>).*").unwrap());

/// Read-only snapshot of the installed plugin's declared metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub version: String,
    pub update_uri: Option<String>,
    pub tested_up_to: Option<String>,
    pub requires_php: Option<String>,
    pub requires_wp: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub author_uri: Option<String>,
    pub plugin_uri: Option<String>,
    /// Path of the main file relative to the plugins directory, `/`-separated
    pub basename: String,
    /// Directory name, or file stem for single-file plugins
    pub slug: String,
    /// Absolute path of the main plugin file
    pub file: PathBuf,
}

impl PluginDescriptor {
    /// True when the plugin lives in its own directory under the plugins root
    pub fn is_directory_plugin(&self) -> bool {
        self.basename.contains('/')
    }
}

/// Read the header block of `plugin_file`, which must live under `plugins_dir`
pub fn read_descriptor(
    plugin_file: &Path,
    plugins_dir: &Path,
) -> Result<PluginDescriptor, DescriptorError> {
    let header_text = read_header_block(plugin_file)?;
    let fields = parse_header_fields(&header_text);

    let name = fields
        .get("name")
        .cloned()
        .ok_or_else(|| DescriptorError::MissingHeader {
            path: plugin_file.to_path_buf(),
        })?;

    let basename = plugin_basename(plugin_file, plugins_dir)?;
    let slug = slug_from_basename(&basename);

    log::debug!("Read plugin header for '{}' ({})", name, basename);

    Ok(PluginDescriptor {
        name,
        version: fields.get("version").cloned().unwrap_or_default(),
        update_uri: fields.get("update_uri").cloned(),
        tested_up_to: fields.get("tested_up_to").cloned(),
        requires_php: fields.get("requires_php").cloned(),
        requires_wp: fields.get("requires_wp").cloned(),
        description: fields.get("description").cloned(),
        author: fields.get("author").cloned(),
        author_uri: fields.get("author_uri").cloned(),
        plugin_uri: fields.get("plugin_uri").cloned(),
        basename,
        slug,
        file: plugin_file.to_path_buf(),
    })
}

fn read_header_block(plugin_file: &Path) -> Result<String, DescriptorError> {
    let io_err = |source| DescriptorError::Io {
        path: plugin_file.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(plugin_file).map_err(io_err)?;
    let mut buffer = Vec::new();
    file.take(HEADER_READ_LIMIT)
        .read_to_end(&mut buffer)
        .map_err(io_err)?;

    Ok(String::from_utf8_lossy(&buffer).replace('\r', "\n"))
}

/// Extract known header values; empty values are treated as absent
pub fn parse_header_fields(text: &str) -> HashMap<&'static str, String> {
    let mut fields = HashMap::new();
    for (field, pattern) in HEADER_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            let cleaned = COMMENT_CLOSE_RE.replace(&captures[1], "");
            let value = cleaned.trim();
            if !value.is_empty() {
                fields.insert(*field, value.to_string());
            }
        }
    }
    fields
}

fn plugin_basename(plugin_file: &Path, plugins_dir: &Path) -> Result<String, DescriptorError> {
    let relative =
        plugin_file
            .strip_prefix(plugins_dir)
            .map_err(|_| DescriptorError::OutsidePluginsDir {
                path: plugin_file.to_path_buf(),
                plugins_dir: plugins_dir.to_path_buf(),
            })?;

    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return Err(DescriptorError::OutsidePluginsDir {
            path: plugin_file.to_path_buf(),
            plugins_dir: plugins_dir.to_path_buf(),
        });
    }

    Ok(parts.join("/"))
}

fn slug_from_basename(basename: &str) -> String {
    match basename.split_once('/') {
        Some((directory, _)) => directory.to_string(),
        None => basename
            .rsplit_once('.')
            .map(|(stem, _)| stem.to_string())
            .unwrap_or_else(|| basename.to_string()),
    }
}
