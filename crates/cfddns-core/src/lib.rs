//! # cfddns-core
//!
//! Core library for the cfddns dynamic DNS updater.
//!
//! A run is a straight line: load and validate configuration, detect the
//! current public address, then for every configured record fetch the live
//! value from the provider and update it only on drift. This crate owns
//! everything except the HTTP edges:
//!
//! - **Config**: canonical configuration model, loaded from either the
//!   current multi-domain or the legacy single-domain JSON shape
//! - **DnsProvider**: trait implemented by provider crates (single-shot,
//!   retry lives here, not in providers)
//! - **RetryPolicy**: bounded exponential backoff over transient failures
//! - **Reconciler**: the fetch/compare/update walk with rate-limit pacing
//! - **IpCache**: best-effort last-applied-IP marker between runs

pub mod cache;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod retry;
pub mod traits;

// Re-export core types for convenience
pub use cache::IpCache;
pub use config::{Config, DomainConfig};
pub use error::{Error, Result};
pub use reconcile::{Reconciler, ReconcilerOptions, RunReport};
pub use retry::RetryPolicy;
pub use traits::{DnsProvider, DnsRecord, RecordKind, RecordUpdate};
