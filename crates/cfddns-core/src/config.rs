//! Configuration model and loading
//!
//! Two file shapes are accepted: the current multi-domain form and a legacy
//! single-domain form. Both are resolved into the canonical [`Config`] once at
//! load time; nothing downstream knows which shape the file used.
//!
//! `ttl` and `proxied` are deliberately tri-state: an absent value means
//! "inherit whatever the provider currently has on the record", which is not
//! the same as any concrete default.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cfddns/config.json";

/// Canonical cfddns configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Cloudflare API token (never logged)
    pub api_token: String,

    /// Domains to reconcile, in file order
    pub domains: Vec<DomainConfig>,
}

/// Per-domain configuration
#[derive(Debug, Clone)]
pub struct DomainConfig {
    /// Registered domain name (e.g. "example.com")
    pub domain: String,

    /// Provider-assigned zone identifier
    pub zone_id: String,

    /// Subdomains to manage; "@" or "" denotes the bare domain
    pub subdomains: Vec<String>,

    /// Record TTL in seconds; None = inherit from the provider
    pub ttl: Option<u32>,

    /// Cloudflare proxy flag; None = inherit from the provider
    pub proxied: Option<bool>,

    /// Whether to also manage AAAA records for this domain
    pub ipv6: bool,
}

/// On-disk file shapes, discriminated by the top-level `domain` key
///
/// A document carrying `domain` is the legacy single-domain shape, even if it
/// also carries a `domains` list; this matches how existing installs are read.
/// All fields other than the discriminating key are optional so that shape
/// selection never masks a missing-field error; [`Config::validate`] reports
/// those precisely after normalization.
#[derive(Debug, Deserialize)]
struct RawMulti {
    api_token: Option<String>,
    domains: Vec<RawDomain>,
}

#[derive(Debug, Deserialize)]
struct RawLegacy {
    api_token: Option<String>,
    domain: String,
    zone_id: Option<String>,
    subdomains: Option<Vec<String>>,
    ttl: Option<u32>,
    proxied: Option<bool>,
    ipv6: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawDomain {
    domain: Option<String>,
    zone_id: Option<String>,
    subdomains: Option<Vec<String>>,
    ttl: Option<u32>,
    proxied: Option<bool>,
    #[serde(default)]
    ipv6: bool,
}

impl Config {
    /// Load and validate a configuration file
    ///
    /// Fails with [`Error::Config`] for a missing file, malformed JSON, or any
    /// missing required field. No network calls are made here or anywhere
    /// before this succeeds.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            Error::config(format!("Invalid JSON in {}: {}", path.display(), e))
        })?;

        Self::from_value(value)
    }

    /// Resolve the parsed document into the canonical, validated form
    ///
    /// Presence of the `domain` key selects the legacy shape.
    fn from_value(value: serde_json::Value) -> Result<Self> {
        let config = if value.get("domain").is_some() {
            tracing::debug!("Using legacy single-domain configuration format");
            let raw: RawLegacy = serde_json::from_value(value)
                .map_err(|e| Error::config(format!("Invalid legacy config: {e}")))?;
            Self {
                api_token: raw.api_token.unwrap_or_default(),
                domains: vec![DomainConfig {
                    domain: raw.domain,
                    zone_id: raw.zone_id.unwrap_or_default(),
                    subdomains: raw.subdomains.unwrap_or_default(),
                    ttl: raw.ttl,
                    proxied: raw.proxied,
                    ipv6: raw.ipv6.unwrap_or(false),
                }],
            }
        } else if value.get("domains").is_some() {
            tracing::debug!("Using multi-domain configuration format");
            let raw: RawMulti = serde_json::from_value(value)
                .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
            Self {
                api_token: raw.api_token.unwrap_or_default(),
                domains: raw
                    .domains
                    .into_iter()
                    .map(|d| DomainConfig {
                        domain: d.domain.unwrap_or_default(),
                        zone_id: d.zone_id.unwrap_or_default(),
                        subdomains: d.subdomains.unwrap_or_default(),
                        ttl: d.ttl,
                        proxied: d.proxied,
                        ipv6: d.ipv6,
                    })
                    .collect(),
            }
        } else {
            return Err(Error::config(
                "config file has neither a 'domain' nor a 'domains' key",
            ));
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate required fields
    pub fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            return Err(Error::config("api_token is missing or empty"));
        }

        if self.domains.is_empty() {
            return Err(Error::config("at least one domain must be configured"));
        }

        for entry in &self.domains {
            if entry.domain.is_empty() {
                return Err(Error::config("domain entry is missing 'domain'"));
            }
            if entry.zone_id.is_empty() {
                return Err(Error::config(format!(
                    "domain '{}' is missing 'zone_id'",
                    entry.domain
                )));
            }
            if entry.subdomains.is_empty() {
                return Err(Error::config(format!(
                    "domain '{}' has no subdomains configured",
                    entry.domain
                )));
            }
        }

        Ok(())
    }

    /// Whether any configured domain wants AAAA records managed
    pub fn wants_ipv6(&self) -> bool {
        self.domains.iter().any(|d| d.ipv6)
    }
}
