//! Trait seams between the reconciler and provider implementations

mod dns_provider;

pub use dns_provider::{DnsProvider, DnsRecord, RecordKind, RecordUpdate};
