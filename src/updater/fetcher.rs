//! Remote metadata fetcher
//!
//! Issues exactly one POST to the host named by the plugin's `Update URI`
//! and hands back the raw JSON object. Every failure mode comes back as a
//! [`FetchFailure`] value.

use crate::core::strings::sanitize_text_field;
use crate::core::version::user_agent;
use crate::updater::error::FetchFailure;
use crate::updater::payload::RawRemotePayload;
use crate::updater::session::UpdateSession;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Which endpoint of the update server is being asked
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FetchAction {
    CheckUpdate,
    PluginInformation,
}

#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(
        &self,
        session: &UpdateSession,
        action: FetchAction,
    ) -> Result<RawRemotePayload, FetchFailure>;
}

/// `scheme://host[:port]/path` of the update URI; credentials, query and
/// fragment are dropped.
pub fn endpoint_url(update_uri: &str) -> Result<reqwest::Url, FetchFailure> {
    let invalid = |cause: String| FetchFailure::InvalidUpdateUri {
        uri: update_uri.to_string(),
        cause,
    };

    let parsed = reqwest::Url::parse(update_uri.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    let host = parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| invalid("missing host".to_string()))?;

    let mut endpoint = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        endpoint.push_str(&format!(":{}", port));
    }
    endpoint.push_str(parsed.path());

    reqwest::Url::parse(&endpoint).map_err(|e| invalid(e.to_string()))
}

/// Request body sent to the update server; every value is sanitized
pub fn request_body(session: &UpdateSession, action: FetchAction) -> Value {
    let descriptor = session.descriptor();
    let credentials = session.credentials();

    let args: Map<String, Value> = credentials
        .extra_args
        .iter()
        .map(|(key, value)| (sanitize_text_field(key), json!(sanitize_text_field(value))))
        .filter(|(key, _)| !key.is_empty())
        .collect();

    json!({
        "type": "plugins",
        "action": action.as_ref(),
        "name": sanitize_text_field(&descriptor.name),
        "slug": sanitize_text_field(&descriptor.slug),
        "version": sanitize_text_field(&descriptor.version),
        "license_key": sanitize_text_field(&credentials.license_key),
        "product_id": sanitize_text_field(&credentials.product_id),
        "args": args,
    })
}

/// reqwest-backed fetcher with a bounded request timeout
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchFailure> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()
            .map_err(|e| FetchFailure::Client {
                cause: e.to_string(),
            })?;
        Ok(Self { client })
    }

    fn warn_on_same_origin(session: &UpdateSession, endpoint: &reqwest::Url) {
        let Some(site_url) = &session.credentials().site_url else {
            return;
        };
        let site_host = reqwest::Url::parse(site_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase));
        let endpoint_host = endpoint.host_str().map(str::to_ascii_lowercase);
        if site_host.is_some() && site_host == endpoint_host {
            log::warn!(
                "Update server {} is served from this site's own host; a site must not act as its own update server",
                endpoint
            );
        }
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(
        &self,
        session: &UpdateSession,
        action: FetchAction,
    ) -> Result<RawRemotePayload, FetchFailure> {
        let descriptor = session.descriptor();
        let update_uri =
            descriptor
                .update_uri
                .as_deref()
                .ok_or_else(|| FetchFailure::MissingUpdateUri {
                    slug: descriptor.slug.clone(),
                })?;

        let endpoint = endpoint_url(update_uri)?;
        Self::warn_on_same_origin(session, &endpoint);

        let body = request_body(session, action);
        log::debug!("POST {} ({}) for '{}'", endpoint, action, descriptor.slug);

        let response = self
            .client
            .post(endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| FetchFailure::Transport {
                url: endpoint.to_string(),
                cause: e.to_string(),
            })?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(FetchFailure::Status {
                url: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| FetchFailure::Transport {
            url: endpoint.to_string(),
            cause: e.to_string(),
        })?;

        let value: Value = serde_json::from_str(&text).map_err(|e| FetchFailure::Decode {
            url: endpoint.to_string(),
            cause: e.to_string(),
        })?;

        RawRemotePayload::from_value(value).ok_or_else(|| FetchFailure::Decode {
            url: endpoint.to_string(),
            cause: "response is not a JSON object".to_string(),
        })
    }
}
