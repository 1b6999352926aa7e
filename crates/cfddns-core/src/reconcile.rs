//! Record reconciliation
//!
//! The reconciler walks every configured (domain, subdomain, record type)
//! tuple sequentially: fetch the live record, compare it to the detected
//! address, and update only on drift. One record's failure never aborts the
//! rest of the run; outcomes are aggregated into a [`RunReport`].
//!
//! Flow per record:
//!
//! 1. Resolve the fully-qualified name ("@"/"" means the bare domain).
//! 2. Fetch the record (retried on transient failure). Missing records are
//!    skipped with a warning.
//! 3. Matching content is the common no-op path.
//! 4. On drift, send an update carrying the config ttl/proxied when set,
//!    otherwise the record's live values.
//! 5. Sleep a fixed delay between record operations to respect provider rate
//!    limits. Deliberate throttling, not retry.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::DomainConfig;
use crate::retry::RetryPolicy;
use crate::traits::{DnsProvider, RecordKind, RecordUpdate};

/// Tuning knobs for a reconciliation run
#[derive(Debug, Clone, Copy)]
pub struct ReconcilerOptions {
    /// Fixed sleep between successive record operations and between domains
    pub record_delay: Duration,

    /// Retry policy applied to every provider call
    pub retry: RetryPolicy,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            record_delay: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

impl ReconcilerOptions {
    /// Options with no sleeps, for tests
    pub fn immediate() -> Self {
        Self {
            record_delay: Duration::ZERO,
            retry: RetryPolicy::immediate(3),
        }
    }
}

/// Aggregated outcome of a reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Records whose content differed from the detected address
    pub updates_needed: usize,
    /// Updates acknowledged by the provider
    pub updates_succeeded: usize,
    /// Records whose lookup still failed after retries
    pub fetch_failures: usize,
    /// Records the provider reported as not existing (skipped)
    pub missing_records: usize,
}

impl RunReport {
    /// Whether everything that needed updating was updated
    ///
    /// Missing records are warnings, not failures; unreachable records are
    /// failures even though they never counted as "needed".
    pub fn is_success(&self) -> bool {
        self.updates_succeeded == self.updates_needed && self.fetch_failures == 0
    }

    /// Whether the cache file should be rewritten after this run
    ///
    /// True when at least one update succeeded, or when nothing needed
    /// updating but the detected address differs from the cached one (all
    /// records already matched a newer IP than the cache knew about).
    /// Never true in dry-run mode: a dry run leaves no persisted trace.
    pub fn cache_should_update(
        &self,
        current: Ipv4Addr,
        cached: Option<Ipv4Addr>,
        dry_run: bool,
    ) -> bool {
        if dry_run {
            return false;
        }
        self.updates_succeeded > 0 || (self.updates_needed == 0 && Some(current) != cached)
    }
}

/// Sequential reconciler over a single DNS provider
pub struct Reconciler {
    provider: Box<dyn DnsProvider>,
    domains: Vec<DomainConfig>,
    options: ReconcilerOptions,
}

/// Fully-qualified record name for a (domain, subdomain) pair
///
/// "@" or the empty string denote the bare domain.
pub fn record_name(domain: &str, subdomain: &str) -> String {
    if subdomain.is_empty() || subdomain == "@" {
        domain.to_string()
    } else {
        format!("{subdomain}.{domain}")
    }
}

impl Reconciler {
    pub fn new(provider: Box<dyn DnsProvider>, domains: Vec<DomainConfig>) -> Self {
        Self::with_options(provider, domains, ReconcilerOptions::default())
    }

    pub fn with_options(
        provider: Box<dyn DnsProvider>,
        domains: Vec<DomainConfig>,
        options: ReconcilerOptions,
    ) -> Self {
        Self {
            provider,
            domains,
            options,
        }
    }

    /// Reconcile every configured record against the detected addresses
    ///
    /// AAAA records are processed only for domains that enable `ipv6`, and
    /// only when an IPv6 address was actually detected this run.
    pub async fn run(&self, ipv4: Ipv4Addr, ipv6: Option<Ipv6Addr>) -> RunReport {
        let mut report = RunReport::default();

        for (domain_index, entry) in self.domains.iter().enumerate() {
            if domain_index > 0 {
                tokio::time::sleep(self.options.record_delay).await;
            }

            info!("Processing domain: {}", entry.domain);

            let mut kinds = vec![(RecordKind::A, IpAddr::V4(ipv4))];
            if entry.ipv6 {
                match ipv6 {
                    Some(ip) => kinds.push((RecordKind::Aaaa, IpAddr::V6(ip))),
                    None => debug!(
                        "No IPv6 address detected, skipping AAAA records for {}",
                        entry.domain
                    ),
                }
            }

            let mut record_index = 0;
            for subdomain in &entry.subdomains {
                let name = record_name(&entry.domain, subdomain);
                for &(kind, desired) in &kinds {
                    if record_index > 0 {
                        tokio::time::sleep(self.options.record_delay).await;
                    }
                    record_index += 1;

                    self.reconcile_record(entry, &name, kind, desired, &mut report)
                        .await;
                }
            }
        }

        report
    }

    async fn reconcile_record(
        &self,
        entry: &DomainConfig,
        name: &str,
        kind: RecordKind,
        desired: IpAddr,
        report: &mut RunReport,
    ) {
        let zone_id = entry.zone_id.as_str();

        let fetched = self
            .options
            .retry
            .run("record lookup", || {
                self.provider.fetch_record(zone_id, name, kind)
            })
            .await;

        let record = match fetched {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!("Skipping {} ({}) - record not found", name, kind);
                report.missing_records += 1;
                return;
            }
            Err(e) => {
                error!("Failed to fetch record {} ({}): {}", name, kind, e);
                report.fetch_failures += 1;
                return;
            }
        };

        if record.content == desired {
            info!("{} already has correct {} content ({})", name, kind, desired);
            return;
        }

        info!("{} needs update: {} -> {}", name, record.content, desired);
        report.updates_needed += 1;

        // Prefer config values; fall back to what the provider currently has.
        let ttl = entry.ttl.unwrap_or(record.ttl);
        let proxied = entry.proxied.unwrap_or(record.proxied);
        if entry.ttl.is_none() {
            debug!("Preserving existing TTL ({}) for {}", record.ttl, name);
        }
        if entry.proxied.is_none() {
            debug!(
                "Preserving existing proxy setting ({}) for {}",
                record.proxied, name
            );
        }

        let update = RecordUpdate {
            record_id: record.id.clone(),
            content: desired,
            ttl,
            proxied,
            kind,
        };

        let result = self
            .options
            .retry
            .run("record update", || {
                self.provider.update_record(zone_id, name, &update)
            })
            .await;

        match result {
            Ok(()) => {
                info!("Successfully updated {} to {}", name, desired);
                report.updates_succeeded += 1;
            }
            Err(e) => {
                error!("Failed to update {}: {}", name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_name_handles_bare_domain_markers() {
        assert_eq!(record_name("example.com", "home"), "home.example.com");
        assert_eq!(record_name("example.com", "@"), "example.com");
        assert_eq!(record_name("example.com", ""), "example.com");
    }

    #[test]
    fn report_success_requires_all_updates_and_no_fetch_failures() {
        let mut report = RunReport::default();
        assert!(report.is_success());

        report.updates_needed = 2;
        report.updates_succeeded = 2;
        assert!(report.is_success());

        report.updates_succeeded = 1;
        assert!(!report.is_success());

        report.updates_succeeded = 2;
        report.fetch_failures = 1;
        assert!(!report.is_success());
    }

    #[test]
    fn cache_updates_on_success_or_fresh_ip() {
        let current: Ipv4Addr = "5.6.7.8".parse().unwrap();
        let stale: Ipv4Addr = "1.2.3.4".parse().unwrap();

        // An update succeeded: always refresh the cache.
        let report = RunReport {
            updates_needed: 1,
            updates_succeeded: 1,
            ..Default::default()
        };
        assert!(report.cache_should_update(current, Some(stale), false));

        // Nothing needed updating but the cache is stale: refresh it.
        let report = RunReport::default();
        assert!(report.cache_should_update(current, Some(stale), false));
        assert!(report.cache_should_update(current, None, false));

        // Nothing needed updating and the cache already matches: leave it.
        assert!(!report.cache_should_update(current, Some(current), false));

        // Updates were needed but all failed: do not advance the cache.
        let report = RunReport {
            updates_needed: 1,
            updates_succeeded: 0,
            ..Default::default()
        };
        assert!(!report.cache_should_update(current, Some(stale), false));
    }

    #[test]
    fn dry_run_never_updates_the_cache() {
        let current: Ipv4Addr = "5.6.7.8".parse().unwrap();
        let stale: Ipv4Addr = "1.2.3.4".parse().unwrap();

        // Every condition that would refresh the cache live is vetoed.
        let report = RunReport {
            updates_needed: 1,
            updates_succeeded: 1,
            ..Default::default()
        };
        assert!(!report.cache_should_update(current, Some(stale), true));
        assert!(!RunReport::default().cache_should_update(current, Some(stale), true));
        assert!(!RunReport::default().cache_should_update(current, None, true));
    }
}
