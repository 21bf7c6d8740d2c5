//! Per-invocation update session
//!
//! The session reads the plugin descriptor once and owns it for the rest of
//! the invocation; fetcher, reconciler and checker borrow it from here.

use crate::updater::descriptor::{read_descriptor, PluginDescriptor};
use crate::updater::error::DescriptorError;
use std::collections::BTreeMap;
use std::path::Path;

/// Identifiers sent along with every update-server request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientCredentials {
    pub license_key: String,
    pub product_id: String,
    /// Caller-supplied extra request arguments
    pub extra_args: BTreeMap<String, String>,
    /// Public URL of the site running the client, used for the
    /// self-hosting origin warning
    pub site_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateSession {
    descriptor: PluginDescriptor,
    credentials: ClientCredentials,
}

impl UpdateSession {
    pub fn new(descriptor: PluginDescriptor, credentials: ClientCredentials) -> Self {
        Self {
            descriptor,
            credentials,
        }
    }

    /// Read the plugin header and open a session around it
    pub fn open(
        plugin_file: &Path,
        plugins_dir: &Path,
        credentials: ClientCredentials,
    ) -> Result<Self, DescriptorError> {
        let descriptor = read_descriptor(plugin_file, plugins_dir)?;
        Ok(Self::new(descriptor, credentials))
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// Key of this plugin's cache entry
    pub fn cache_key(&self) -> &str {
        &self.descriptor.slug
    }
}
