//! # HTTP IP detection
//!
//! Resolves the caller's current public address by walking an ordered list of
//! third-party IP-echo services and returning the first usable answer.
//!
//! Each endpoint is a (URL, response format) pair: either the whole trimmed
//! body is the address, or the body is JSON and the address sits under a
//! named key. Any failure — non-200 status, timeout, unparseable body, an
//! address of the wrong family — logs a warning and falls through to the next
//! endpoint. Endpoints after the first success are never contacted.
//!
//! IPv4 and IPv6 use independent endpoint lists because most echo services
//! answer on one address family only.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tracing::{debug, error, warn};

use cfddns_core::{Error, Result};

/// Per-request timeout for detection calls
const DETECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How an IP-echo endpoint encodes its answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormat {
    /// The entire trimmed response body is the address
    PlainText,
    /// The body is JSON; the address sits under this key
    Json { key: String },
}

/// A single IP-echo service
#[derive(Debug, Clone)]
pub struct IpEndpoint {
    pub url: String,
    pub format: ResponseFormat,
}

impl IpEndpoint {
    pub fn plain(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ResponseFormat::PlainText,
        }
    }

    pub fn json(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ResponseFormat::Json { key: key.into() },
        }
    }
}

/// Default IPv4 detection endpoints, in preference order
fn default_v4_endpoints() -> Vec<IpEndpoint> {
    vec![
        IpEndpoint::json("https://api.ipify.org?format=json", "ip"),
        IpEndpoint::json("https://ipinfo.io/json", "ip"),
        IpEndpoint::plain("https://api.ip.sb/ip"),
        IpEndpoint::plain("https://checkip.amazonaws.com"),
    ]
}

/// Default IPv6 detection endpoints, in preference order
fn default_v6_endpoints() -> Vec<IpEndpoint> {
    vec![
        IpEndpoint::json("https://api6.ipify.org?format=json", "ip"),
        IpEndpoint::plain("https://ipv6.icanhazip.com"),
        IpEndpoint::plain("https://v6.ident.me"),
    ]
}

/// Public IP detector with ordered endpoint fallback
pub struct IpDetector {
    client: reqwest::Client,
    v4_endpoints: Vec<IpEndpoint>,
    v6_endpoints: Vec<IpEndpoint>,
}

impl Default for IpDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl IpDetector {
    /// Detector with the default endpoint lists
    pub fn new() -> Self {
        Self::with_endpoints(default_v4_endpoints(), default_v6_endpoints())
    }

    /// Detector with explicit endpoint lists (used by tests)
    pub fn with_endpoints(v4_endpoints: Vec<IpEndpoint>, v6_endpoints: Vec<IpEndpoint>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(DETECT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            v4_endpoints,
            v6_endpoints,
        }
    }

    /// Detect the current public IPv4 address
    ///
    /// Hard failure: if every endpoint fails the run cannot proceed, since
    /// A records are always managed.
    pub async fn detect_v4(&self) -> Result<Ipv4Addr> {
        for endpoint in &self.v4_endpoints {
            match self.probe(endpoint).await {
                Ok(IpAddr::V4(ip)) => {
                    debug!("Detected public IPv4 {} via {}", ip, endpoint.url);
                    return Ok(ip);
                }
                Ok(IpAddr::V6(ip)) => {
                    warn!("{} returned an IPv6 address ({}), skipping", endpoint.url, ip);
                }
                Err(e) => {
                    warn!("Failed to get IP from {}: {}", endpoint.url, e);
                }
            }
        }

        Err(Error::detection(
            "failed to detect public IPv4 address from all services",
        ))
    }

    /// Detect the current public IPv6 address
    ///
    /// Soft failure: `None` means AAAA records are skipped for this run.
    pub async fn detect_v6(&self) -> Option<Ipv6Addr> {
        for endpoint in &self.v6_endpoints {
            match self.probe(endpoint).await {
                Ok(IpAddr::V6(ip)) => {
                    debug!("Detected public IPv6 {} via {}", ip, endpoint.url);
                    return Some(ip);
                }
                Ok(IpAddr::V4(ip)) => {
                    warn!("{} returned an IPv4 address ({}), skipping", endpoint.url, ip);
                }
                Err(e) => {
                    warn!("Failed to get IPv6 from {}: {}", endpoint.url, e);
                }
            }
        }

        error!("Failed to detect public IPv6 address from all services");
        None
    }

    /// Query one endpoint and extract the address from its body
    async fn probe(&self, endpoint: &IpEndpoint) -> Result<IpAddr> {
        let response = self
            .client
            .get(&endpoint.url)
            .send()
            .await
            .map_err(|e| Error::transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::transport(format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("failed to read body: {e}")))?;

        let ip_text = match &endpoint.format {
            ResponseFormat::PlainText => body.trim().to_string(),
            ResponseFormat::Json { key } => {
                let json: serde_json::Value = serde_json::from_str(&body)
                    .map_err(|e| Error::detection(format!("malformed JSON body: {e}")))?;
                json.get(key)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        Error::detection(format!("JSON body has no string field '{key}'"))
                    })?
                    .to_string()
            }
        };

        ip_text
            .parse()
            .map_err(|_| Error::detection(format!("invalid IP address: {ip_text}")))
    }
}
