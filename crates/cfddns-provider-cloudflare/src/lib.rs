//! # Cloudflare DNS provider
//!
//! Implements the core `DnsProvider` trait against the Cloudflare API v4:
//!
//! - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
//! - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
//!
//! The provider is single-shot: no retry, no backoff, no pacing. The
//! reconciler owns all of that, so the error mapping here is what makes
//! retry decisions possible — connection failures and 5xx/429 answers map to
//! the transient class, while well-formed rejections (4xx bodies,
//! `success: false`) are definitive and map to the provider class.
//!
//! The API token never appears in logs or Debug output.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, info};

use cfddns_core::error::{Error, Result};
use cfddns_core::traits::{DnsProvider, DnsRecord, RecordKind, RecordUpdate};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare DNS provider
///
/// # Dry-run mode
///
/// When `dry_run` is true the provider performs record lookups normally but
/// logs intended updates instead of sending them, reporting success so the
/// rest of the run (counters, summary) behaves as it would live.
pub struct CloudflareProvider {
    api_token: String,
    base_url: String,
    client: reqwest::Client,
    dry_run: bool,
}

// The Debug implementation intentionally does not expose the API token.
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Standard Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RecordPayload {
    id: String,
    content: String,
    proxied: bool,
    ttl: u32,
}

fn describe_errors(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "no error detail provided".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{} (code {})", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ")
}

impl CloudflareProvider {
    /// Create a provider with the given API token
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Override the API base URL (used by tests against a local mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Classify the HTTP response and parse the Cloudflare envelope
    ///
    /// 5xx and 429 answers are transient; any other non-2xx answer is a
    /// definitive rejection, as is a 2xx body that fails to parse.
    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<ApiEnvelope<T>> {
        let status = response.status();

        if status.is_server_error() || status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(format!(
                "{what} failed with HTTP {status}: {body}"
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(format!(
                "{what} rejected with HTTP {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::provider(format!("{what} returned an unparseable body: {e}")))
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn fetch_record(
        &self,
        zone_id: &str,
        name: &str,
        kind: RecordKind,
    ) -> Result<Option<DnsRecord>> {
        debug!("Looking up record {} (type {})", name, kind);

        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[("name", name), ("type", kind.as_str())])
            .send()
            .await
            .map_err(|e| Error::transport(format!("record lookup request failed: {e}")))?;

        let envelope: ApiEnvelope<Vec<RecordPayload>> =
            Self::read_envelope(response, "record lookup").await?;

        if !envelope.success {
            return Err(Error::provider(format!(
                "record lookup for {} failed: {}",
                name,
                describe_errors(&envelope.errors)
            )));
        }

        let Some(payload) = envelope.result.unwrap_or_default().into_iter().next() else {
            return Ok(None);
        };

        let content: IpAddr = payload.content.parse().map_err(|_| {
            Error::provider(format!(
                "record {} has non-address content '{}'",
                name, payload.content
            ))
        })?;

        Ok(Some(DnsRecord {
            id: payload.id,
            content,
            proxied: payload.proxied,
            ttl: payload.ttl,
        }))
    }

    async fn update_record(&self, zone_id: &str, name: &str, update: &RecordUpdate) -> Result<()> {
        let payload = serde_json::json!({
            "type": update.kind.as_str(),
            "name": name,
            "content": update.content.to_string(),
            "ttl": update.ttl,
            "proxied": update.proxied,
        });

        if self.dry_run {
            info!(
                "[DRY-RUN] Would update {} ({}) with payload: {}",
                name, update.kind, payload
            );
            return Ok(());
        }

        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.base_url, zone_id, update.record_id
        );
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::transport(format!("record update request failed: {e}")))?;

        let envelope: ApiEnvelope<RecordPayload> =
            Self::read_envelope(response, "record update").await?;

        if !envelope.success {
            return Err(Error::provider(format!(
                "record update for {} failed: {}",
                name,
                describe_errors(&envelope.errors)
            )));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
