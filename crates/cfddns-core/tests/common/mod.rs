//! Test doubles and helpers for reconciler scenario tests

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cfddns_core::config::DomainConfig;
use cfddns_core::error::{Error, Result};
use cfddns_core::traits::{DnsProvider, DnsRecord, RecordKind, RecordUpdate};

/// Failure kinds a test can script ahead of a call
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Transient transport failure (eligible for retry)
    Transport,
    /// Well-formed provider rejection (never retried)
    Provider,
}

impl Fault {
    fn to_error(self) -> Error {
        match self {
            Fault::Transport => Error::transport("simulated network failure"),
            Fault::Provider => Error::provider("simulated provider rejection"),
        }
    }
}

/// A scripted DnsProvider that tracks calls
///
/// Records are keyed by `name:KIND`. Faults queued for a key are consumed
/// one per call before the call falls through to its normal behavior.
pub struct MockProvider {
    records: Mutex<HashMap<String, DnsRecord>>,
    fetch_faults: Mutex<HashMap<String, VecDeque<Fault>>>,
    update_faults: Mutex<HashMap<String, VecDeque<Fault>>>,
    fetch_calls: AtomicUsize,
    update_calls: AtomicUsize,
    updates: Mutex<Vec<AppliedUpdate>>,
}

/// An update the mock accepted, with everything the provider would have seen
#[derive(Debug, Clone)]
pub struct AppliedUpdate {
    pub zone_id: String,
    pub name: String,
    pub update: RecordUpdate,
}

fn key(name: &str, kind: RecordKind) -> String {
    format!("{name}:{kind}")
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fetch_faults: Mutex::new(HashMap::new()),
            update_faults: Mutex::new(HashMap::new()),
            fetch_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            updates: Mutex::new(Vec::new()),
        }
    }

    /// Seed a live record on the provider
    pub fn with_record(
        self,
        name: &str,
        kind: RecordKind,
        content: &str,
        proxied: bool,
        ttl: u32,
    ) -> Self {
        let record = DnsRecord {
            id: format!("id-{}", key(name, kind)),
            content: content.parse().expect("test record content must be an IP"),
            proxied,
            ttl,
        };
        self.records.lock().unwrap().insert(key(name, kind), record);
        self
    }

    /// Queue faults to be consumed by the next fetches of this record
    pub fn queue_fetch_faults(&self, name: &str, kind: RecordKind, faults: &[Fault]) {
        self.fetch_faults
            .lock()
            .unwrap()
            .entry(key(name, kind))
            .or_default()
            .extend(faults.iter().copied());
    }

    /// Queue faults to be consumed by the next updates of this record
    pub fn queue_update_faults(&self, name: &str, kind: RecordKind, faults: &[Fault]) {
        self.update_faults
            .lock()
            .unwrap()
            .entry(key(name, kind))
            .or_default()
            .extend(faults.iter().copied());
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn applied_updates(&self) -> Vec<AppliedUpdate> {
        self.updates.lock().unwrap().clone()
    }

    fn take_fault(map: &Mutex<HashMap<String, VecDeque<Fault>>>, key: &str) -> Option<Fault> {
        map.lock().unwrap().get_mut(key).and_then(|q| q.pop_front())
    }
}

#[async_trait]
impl DnsProvider for MockProvider {
    async fn fetch_record(
        &self,
        _zone_id: &str,
        name: &str,
        kind: RecordKind,
    ) -> Result<Option<DnsRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let key = key(name, kind);
        if let Some(fault) = Self::take_fault(&self.fetch_faults, &key) {
            return Err(fault.to_error());
        }

        Ok(self.records.lock().unwrap().get(&key).cloned())
    }

    async fn update_record(&self, zone_id: &str, name: &str, update: &RecordUpdate) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let key = key(name, update.kind);
        if let Some(fault) = Self::take_fault(&self.update_faults, &key) {
            return Err(fault.to_error());
        }

        if let Some(record) = self.records.lock().unwrap().get_mut(&key) {
            record.content = update.content;
            record.ttl = update.ttl;
            record.proxied = update.proxied;
        }

        self.updates.lock().unwrap().push(AppliedUpdate {
            zone_id: zone_id.to_string(),
            name: name.to_string(),
            update: update.clone(),
        });
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// Tests keep an Arc handle for assertions while the reconciler owns a boxed
// clone of the same provider. A local newtype is needed because the orphan
// rule forbids implementing the foreign trait directly for Arc<MockProvider>.
pub struct SharedProvider(pub std::sync::Arc<MockProvider>);

#[async_trait]
impl DnsProvider for SharedProvider {
    async fn fetch_record(
        &self,
        zone_id: &str,
        name: &str,
        kind: RecordKind,
    ) -> Result<Option<DnsRecord>> {
        self.0.fetch_record(zone_id, name, kind).await
    }

    async fn update_record(&self, zone_id: &str, name: &str, update: &RecordUpdate) -> Result<()> {
        self.0.update_record(zone_id, name, update).await
    }

    fn provider_name(&self) -> &'static str {
        self.0.provider_name()
    }
}

/// Minimal domain entry with ttl/proxied left to inherit from the provider
pub fn domain(name: &str, zone_id: &str, subdomains: &[&str]) -> DomainConfig {
    DomainConfig {
        domain: name.to_string(),
        zone_id: zone_id.to_string(),
        subdomains: subdomains.iter().map(|s| s.to_string()).collect(),
        ttl: None,
        proxied: None,
        ipv6: false,
    }
}

/// Parse helper for expected addresses in assertions
pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}
