//! Update checker
//!
//! Glues the session, fetcher, reconciler and cache together. Remote failures
//! never escape from here: an unreachable server simply means "no update".

use crate::core::time::{Clock, SystemClock};
use crate::updater::cache::{CachedDecision, UpdateCache, DEFAULT_CACHE_TTL_SECS};
use crate::updater::decision::{build_info, decide_update, info_defaults, update_defaults, PluginInfo, UpdateDecision};
use crate::updater::error::{FetchFailure, UpdaterError, UpdaterResult};
use crate::updater::fetcher::{FetchAction, MetadataFetcher};
use crate::updater::payload::RawRemotePayload;
use crate::updater::reconciler::reconcile;
use crate::updater::record::CanonicalUpdateRecord;
use crate::updater::session::UpdateSession;
use std::sync::Arc;

pub const DEFAULT_REDIRECT: &str = "plugins.php";

pub struct UpdateChecker {
    session: Arc<UpdateSession>,
    fetcher: Arc<dyn MetadataFetcher>,
    cache: Arc<dyn UpdateCache>,
    clock: Arc<dyn Clock>,
    ttl_secs: i64,
    redirect_to: String,
}

impl UpdateChecker {
    pub fn new(
        session: Arc<UpdateSession>,
        fetcher: Arc<dyn MetadataFetcher>,
        cache: Arc<dyn UpdateCache>,
    ) -> Self {
        Self {
            session,
            fetcher,
            cache,
            clock: Arc::new(SystemClock),
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            redirect_to: DEFAULT_REDIRECT.to_string(),
        }
    }

    pub fn with_ttl(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_redirect(mut self, redirect_to: impl Into<String>) -> Self {
        self.redirect_to = redirect_to.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn session(&self) -> &UpdateSession {
        &self.session
    }

    /// Fetch one endpoint and reconcile it against that projection's defaults
    pub async fn fetch_record(
        &self,
        action: FetchAction,
    ) -> Result<CanonicalUpdateRecord, FetchFailure> {
        let raw = self.fetcher.fetch(&self.session, action).await?;
        Ok(self.reconcile_for(action, &raw))
    }

    fn reconcile_for(&self, action: FetchAction, raw: &RawRemotePayload) -> CanonicalUpdateRecord {
        let descriptor = self.session.descriptor();
        let defaults = match action {
            FetchAction::CheckUpdate => update_defaults(descriptor),
            FetchAction::PluginInformation => info_defaults(descriptor),
        };
        reconcile(raw, descriptor, &defaults)
    }

    /// Update decision, served from the cache while fresh
    pub async fn check(&self) -> UpdateDecision {
        let key = self.session.cache_key();
        match self.cache.get(key) {
            Ok(Some(cached)) if cached.is_fresh(self.clock.unix_now(), self.ttl_secs) => {
                log::debug!("Using cached update decision for '{}'", key);
                return cached.decision;
            }
            Ok(_) => {}
            Err(e) => log::warn!("Update cache unavailable, checking remotely: {}", e),
        }
        self.check_now().await
    }

    /// Update decision from the server, bypassing (and refreshing) the cache
    pub async fn check_now(&self) -> UpdateDecision {
        let descriptor = self.session.descriptor();
        let decision = match self.fetch_record(FetchAction::CheckUpdate).await {
            Ok(record) => decide_update(&record, descriptor),
            Err(failure) => {
                log::warn!(
                    "Update check for '{}' failed ({}): {}",
                    descriptor.slug,
                    failure.code(),
                    failure
                );
                UpdateDecision::fetch_failed(descriptor)
            }
        };

        let entry = CachedDecision {
            checked_at: self.clock.unix_now(),
            decision: decision.clone(),
        };
        if let Err(e) = self.cache.put(self.session.cache_key(), &entry) {
            log::warn!("Could not store update decision: {}", e);
        }
        decision
    }

    /// Details view; falls back to the local descriptor when the server fails
    pub async fn plugin_info(&self) -> PluginInfo {
        let descriptor = self.session.descriptor();
        let record = match self.fetch_record(FetchAction::PluginInformation).await {
            Ok(record) => record,
            Err(failure) => {
                log::warn!(
                    "Plugin details for '{}' unavailable ({}): {}",
                    descriptor.slug,
                    failure.code(),
                    failure
                );
                self.reconcile_for(FetchAction::PluginInformation, &RawRemotePayload::default())
            }
        };
        build_info(&record, descriptor)
    }

    pub fn invalidate(&self) -> UpdaterResult<()> {
        self.cache.invalidate(self.session.cache_key())?;
        Ok(())
    }

    /// Clear the cached decision and hand back where the caller goes next.
    /// Idempotent.
    pub fn force_recheck(&self, capability_ok: bool) -> UpdaterResult<String> {
        if !capability_ok {
            return Err(UpdaterError::Forbidden);
        }
        self.invalidate()?;
        log::info!(
            "Cleared cached update state for '{}'",
            self.session.descriptor().slug
        );
        Ok(self.redirect_to.clone())
    }
}
