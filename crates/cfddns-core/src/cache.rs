//! Last-applied IP cache
//!
//! A single plaintext file holding the IPv4 address last written to any
//! record. Best-effort and non-authoritative: the reconciler always
//! re-verifies against the provider's live records, so a missing, stale, or
//! unreadable cache is never an error.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default location of the cache file
pub const DEFAULT_CACHE_PATH: &str = "/var/cache/cfddns/last_ip";

/// File-backed cache of the last successfully applied IPv4 address
#[derive(Debug)]
pub struct IpCache {
    path: PathBuf,
}

impl IpCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read the cached address, treating any failure as "unknown"
    pub async fn load(&self) -> Option<Ipv4Addr> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read cache file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match content.trim().parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                warn!(
                    "Cache file {} does not contain a valid IPv4 address",
                    self.path.display()
                );
                None
            }
        }
    }

    /// Persist the address, creating parent directories as needed
    ///
    /// Callers log failure at warning level and continue; a cache write error
    /// never fails the run.
    pub async fn store(&self, ip: Ipv4Addr) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::cache(format!(
                        "Failed to create cache directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        fs::write(&self.path, ip.to_string()).await.map_err(|e| {
            Error::cache(format!(
                "Failed to write cache file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("Cached last applied IP {} at {}", ip, self.path.display());
        Ok(())
    }
}
