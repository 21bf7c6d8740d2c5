//! Fixtures shared by the update-checking and rollback tests

use crate::updater::descriptor::PluginDescriptor;
use crate::updater::error::FetchFailure;
use crate::updater::fetcher::{FetchAction, MetadataFetcher};
use crate::updater::payload::RawRemotePayload;
use crate::updater::session::{ClientCredentials, UpdateSession};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) fn descriptor(version: &str) -> PluginDescriptor {
    PluginDescriptor {
        name: "Acme Forms".to_string(),
        version: version.to_string(),
        update_uri: Some("https://updates.acme.test/api".to_string()),
        tested_up_to: Some("6.4".to_string()),
        requires_php: Some("7.4".to_string()),
        requires_wp: Some("6.0".to_string()),
        description: Some("Forms for everyone.".to_string()),
        author: Some("Acme".to_string()),
        author_uri: Some("https://acme.test".to_string()),
        plugin_uri: Some("https://acme.test/forms".to_string()),
        basename: "acme-forms/acme-forms.php".to_string(),
        slug: "acme-forms".to_string(),
        file: PathBuf::from("/srv/site/plugins/acme-forms/acme-forms.php"),
    }
}

pub(crate) fn session(version: &str) -> UpdateSession {
    UpdateSession::new(descriptor(version), ClientCredentials::default())
}

pub(crate) fn payload(value: Value) -> RawRemotePayload {
    RawRemotePayload::from_value(value).expect("payload fixtures are JSON objects")
}

/// Fetcher answering every action with the same canned response
pub(crate) struct FakeFetcher {
    response: Mutex<Result<RawRemotePayload, FetchFailure>>,
    calls: AtomicUsize,
    actions: Mutex<Vec<FetchAction>>,
}

impl FakeFetcher {
    pub(crate) fn answering(value: Value) -> Self {
        Self::with_response(Ok(payload(value)))
    }

    pub(crate) fn failing() -> Self {
        Self::with_response(Err(FetchFailure::Status {
            url: "https://updates.acme.test/api".to_string(),
            status: 503,
        }))
    }

    fn with_response(response: Result<RawRemotePayload, FetchFailure>) -> Self {
        Self {
            response: Mutex::new(response),
            calls: AtomicUsize::new(0),
            actions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond_with(&self, value: Value) {
        *self.response.lock().unwrap() = Ok(payload(value));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn actions(&self) -> Vec<FetchAction> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataFetcher for FakeFetcher {
    async fn fetch(
        &self,
        _session: &UpdateSession,
        action: FetchAction,
    ) -> Result<RawRemotePayload, FetchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.actions.lock().unwrap().push(action);
        self.response.lock().unwrap().clone()
    }
}
