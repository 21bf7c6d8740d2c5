//! Rollback harness wired from fakes

use crate::core::time::ManualClock;
use crate::install::tests::helpers::{FakeHost, FakeInstaller};
use crate::rollback::nonce::{rollback_nonce_action, TickNonce};
use crate::rollback::orchestrator::{RollbackOptions, RollbackOrchestrator};
use crate::rollback::request::{RollbackRequest, RollbackResult};
use crate::updater::cache::{CachedDecision, MemoryUpdateCache, UpdateCache};
use crate::updater::checker::UpdateChecker;
use crate::updater::decision::UpdateDecision;
use crate::updater::tests::helpers::{descriptor, session, FakeFetcher};
use serde_json::{json, Value};
use std::sync::Arc;

pub(crate) const NOW: i64 = 1_700_000_000;
pub(crate) const BASENAME: &str = "acme-forms/acme-forms.php";
pub(crate) const SESSION: &str = "session-alice";

pub(crate) fn catalog_payload() -> Value {
    json!({
        "new_version": "2.1.0",
        "download_link": "https://updates.acme.test/packages/2.1.0.zip",
        "versions": {
            "2.0.0": "https://updates.acme.test/packages/2.0.0.zip",
            "1.8.0": "https://updates.acme.test/packages/1.8.0.zip"
        },
        "allow_rollback": "yes"
    })
}

pub(crate) struct Harness {
    pub(crate) fetcher: Arc<FakeFetcher>,
    pub(crate) cache: Arc<MemoryUpdateCache>,
    pub(crate) host: Arc<FakeHost>,
    pub(crate) nonces: Arc<TickNonce>,
    pub(crate) installer: FakeInstaller,
    pub(crate) options: RollbackOptions,
}

impl Harness {
    pub(crate) fn new(fetcher: FakeFetcher, host: FakeHost) -> Self {
        let clock = Arc::new(ManualClock::at(NOW));
        Self {
            fetcher: Arc::new(fetcher),
            cache: Arc::new(MemoryUpdateCache::new()),
            host: Arc::new(host),
            nonces: Arc::new(TickNonce::new("test-secret", 86_400).with_clock(clock)),
            installer: FakeInstaller::default(),
            options: RollbackOptions::new("/srv/site/plugins"),
        }
    }

    /// Active plugin, server offering a rollback catalog
    pub(crate) fn active() -> Self {
        Self::new(FakeFetcher::answering(catalog_payload()), FakeHost::with_active(BASENAME))
    }

    pub(crate) fn request(&self, target_version: &str) -> RollbackRequest {
        RollbackRequest {
            plugin_id: BASENAME.to_string(),
            target_version: target_version.to_string(),
            nonce: self.nonces.create(&rollback_nonce_action(BASENAME), SESSION),
            actor_capability_ok: true,
            session_token: SESSION.to_string(),
        }
    }

    /// Seed the cache so invalidation is observable
    pub(crate) fn seed_cache(&self) {
        let entry = CachedDecision {
            checked_at: NOW,
            decision: UpdateDecision::fetch_failed(&descriptor("2.0.0")),
        };
        self.cache.put("acme-forms", &entry).unwrap();
    }

    pub(crate) fn cached(&self) -> bool {
        self.cache.get("acme-forms").unwrap().is_some()
    }

    pub(crate) async fn run(&mut self, request: &RollbackRequest) -> RollbackResult {
        let checker = UpdateChecker::new(
            Arc::new(session("2.0.0")),
            self.fetcher.clone(),
            self.cache.clone(),
        );
        let orchestrator = RollbackOrchestrator::new(
            Arc::new(checker),
            self.nonces.clone(),
            self.host.clone(),
            self.options.clone(),
        );
        orchestrator.run(request, &mut self.installer).await
    }
}
