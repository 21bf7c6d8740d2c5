//! Public API for update checking
//!
//! External modules should import from here rather than directly from
//! internal modules.

pub use crate::updater::cache::{
    CachedDecision, FileUpdateCache, MemoryUpdateCache, UpdateCache, DEFAULT_CACHE_TTL_SECS,
};
pub use crate::updater::checker::{UpdateChecker, DEFAULT_REDIRECT};
pub use crate::updater::decision::{
    build_info, decide_update, info_defaults, update_defaults, NoUpdate, NoUpdateReason,
    PluginInfo, UpdateDecision, UpdateOffer,
};
pub use crate::updater::descriptor::{read_descriptor, PluginDescriptor};
pub use crate::updater::error::{
    CacheError, CacheResult, DescriptorError, FetchFailure, UpdaterError, UpdaterResult,
};
pub use crate::updater::fetcher::{
    endpoint_url, FetchAction, HttpMetadataFetcher, MetadataFetcher, DEFAULT_TIMEOUT_SECS,
};
pub use crate::updater::payload::RawRemotePayload;
pub use crate::updater::reconciler::{reconcile, ReconcileDefaults};
pub use crate::updater::record::{CanonicalUpdateRecord, Screenshot, TRUNK};
pub use crate::updater::sanitize::sanitize_html;
pub use crate::updater::session::{ClientCredentials, UpdateSession};
pub use crate::updater::version::{compare_versions, is_newer};
