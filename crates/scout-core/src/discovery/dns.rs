//! DNS-TXT half of manifest discovery.
//!
//! An organization can announce its manifest by publishing a TXT record
//! containing `m=<url>` on a probeable domain. Resolution is behind the
//! [`TxtResolver`] trait so tests (and embedders with their own resolver
//! stack) can substitute the lookup; the production implementation wraps the
//! hickory tokio resolver.

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};

use crate::{Error, Result};

/// Marker introducing the manifest pointer inside a TXT record.
pub const MANIFEST_MARKER: &str = "m=";

/// TXT record lookup for a domain.
#[async_trait]
pub trait TxtResolver: Send + Sync {
    /// All TXT record strings published on `domain`.
    ///
    /// Resolution failures surface as [`Error::Upstream`]; the prober folds
    /// them into a candidate failure rather than aborting discovery.
    async fn txt_records(&self, domain: &str) -> Result<Vec<String>>;
}

/// Production resolver backed by hickory's tokio runtime resolver.
pub struct HickoryTxtResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryTxtResolver {
    /// Resolver using hickory's default upstream configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }

    /// Resolver using the host's system configuration (`/etc/resolv.conf`).
    pub fn from_system_conf() -> Result<Self> {
        TokioAsyncResolver::tokio_from_system_conf()
            .map(|resolver| Self { resolver })
            .map_err(|err| Error::Config(format!("system resolver configuration: {err}")))
    }
}

impl Default for HickoryTxtResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    async fn txt_records(&self, domain: &str) -> Result<Vec<String>> {
        let lookup = self
            .resolver
            .txt_lookup(domain)
            .await
            .map_err(|err| Error::Upstream(format!("TXT lookup for {domain}: {err}")))?;

        Ok(lookup
            .iter()
            .map(|record| {
                record
                    .txt_data()
                    .iter()
                    .map(|segment| String::from_utf8_lossy(segment))
                    .collect::<String>()
            })
            .collect())
    }
}

/// Extract the manifest pointer from a set of TXT records.
///
/// The first record containing [`MANIFEST_MARKER`] wins; the pointer is the
/// trimmed text after the marker's *last* occurrence in that record, so a
/// value that itself contains `m=` still resolves to its tail.
#[must_use]
pub fn manifest_pointer(records: &[String]) -> Option<String> {
    let record = records.iter().find(|r| r.contains(MANIFEST_MARKER))?;
    let (_, tail) = record.rsplit_once(MANIFEST_MARKER)?;
    let pointer = tail.trim();
    if pointer.is_empty() {
        None
    } else {
        Some(pointer.to_string())
    }
}
