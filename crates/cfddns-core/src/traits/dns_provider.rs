//! DNS provider trait
//!
//! Defines the two provider operations the reconciler needs: an exact
//! name+type record lookup and a record update. Implementations are
//! single-shot: no retry, no backoff, no pacing — all of that is owned by the
//! reconciler so it stays uniform across operations and countable in tests.

use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;

use crate::error::Result;

/// DNS record type managed by the updater
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordKind {
    /// Wire form of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS record as currently held by the provider
///
/// Transient: fetched fresh every run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned record identifier
    pub id: String,
    /// Current address on the record
    pub content: IpAddr,
    /// Whether traffic is routed through the provider's proxy layer
    pub proxied: bool,
    /// Record TTL in seconds
    pub ttl: u32,
}

/// Payload for a record update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// Identifier of the record to rewrite
    pub record_id: String,
    /// New address to set
    pub content: IpAddr,
    /// TTL to send (resolved by the reconciler, never a hardcoded default)
    pub ttl: u32,
    /// Proxy flag to send (resolved by the reconciler)
    pub proxied: bool,
    /// Record type being written
    pub kind: RecordKind,
}

/// Trait for DNS provider implementations
///
/// # Error contract
///
/// - Transient transport failures map to `Error::Transport` so the reconciler
///   can retry them.
/// - Well-formed provider rejections (4xx bodies, `success: false`) map to
///   `Error::Provider` and are never retried.
///
/// # Thread safety
///
/// Implementations must be usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up the record of the given type exactly matching `name`
    ///
    /// Returns `Ok(None)` when the provider reports success with an empty
    /// result set (no such record).
    async fn fetch_record(
        &self,
        zone_id: &str,
        name: &str,
        kind: RecordKind,
    ) -> Result<Option<DnsRecord>>;

    /// Rewrite an existing record
    ///
    /// Succeeds only if the provider acknowledges the update. In dry-run mode
    /// implementations log the intended payload and report success without
    /// issuing any mutating call.
    async fn update_record(&self, zone_id: &str, name: &str, update: &RecordUpdate) -> Result<()>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}
