//! Ordered fallback probing over the candidate sequence.
//!
//! Candidates are tried strictly in order. A DNS candidate resolves TXT
//! records, extracts the `m=` pointer, and fetches it; a well-known
//! candidate tries the three fixed suffix paths under `/.well-known/`. The
//! first success short-circuits the walk: later candidates keep `check=null`
//! (skipped), the winner gets `check=true` and its resolved URL, failures
//! get `check=false`. The fully annotated list is the discovery trace.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::fetcher::{ContentFetcher, ManifestContent};
use crate::types::{Candidate, ProbeKind};

use super::dns::{TxtResolver, manifest_pointer};

/// Fixed suffix order of the well-known probe.
const WELL_KNOWN_SUFFIXES: [&str; 3] = ["", ".json", ".yaml"];

/// Outcome of probing one candidate sequence.
#[derive(Debug)]
pub struct Discovery {
    /// The candidate list, annotated in place; same length and order as the
    /// planner's output.
    pub trace: Vec<Candidate>,
    /// URL of the winning candidate's manifest, if any succeeded.
    pub manifest_url: Option<String>,
    /// Classified body fetched from the winning URL.
    pub content: Option<ManifestContent>,
}

impl Discovery {
    #[must_use]
    pub const fn manifest_found(&self) -> bool {
        self.manifest_url.is_some()
    }
}

/// Walks candidate sequences using DNS-TXT and well-known lookups.
pub struct Prober {
    dns: Arc<dyn TxtResolver>,
    fetcher: ContentFetcher,
    well_known_stem: String,
}

impl Prober {
    #[must_use]
    pub fn new(dns: Arc<dyn TxtResolver>, fetcher: ContentFetcher, well_known_stem: String) -> Self {
        Self {
            dns,
            fetcher,
            well_known_stem,
        }
    }

    /// Probe candidates in order, stopping at the first success.
    ///
    /// Upstream faults never escape: a failed lookup or fetch is that
    /// candidate's failure and the walk continues.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn probe(&self, mut candidates: Vec<Candidate>) -> Discovery {
        let mut manifest_url = None;
        let mut content = None;

        for candidate in &mut candidates {
            let outcome = match candidate.kind {
                ProbeKind::Dns => self.probe_dns(&candidate.domain).await,
                ProbeKind::WellKnown => self.probe_well_known(&candidate.domain).await,
            };

            match outcome {
                Some((url, body)) => {
                    debug!(domain = %candidate.domain, kind = ?candidate.kind, %url, "candidate succeeded");
                    candidate.check = Some(true);
                    candidate.path = Some(url.clone());
                    manifest_url = Some(url);
                    content = Some(body);
                    // Later candidates stay untested (check=null).
                    break;
                },
                None => {
                    debug!(domain = %candidate.domain, kind = ?candidate.kind, "candidate failed");
                    candidate.check = Some(false);
                },
            }
        }

        Discovery {
            trace: candidates,
            manifest_url,
            content,
        }
    }

    /// TXT lookup, marker extraction, then a direct fetch of the pointer.
    async fn probe_dns(&self, domain: &str) -> Option<(String, ManifestContent)> {
        let records = match self.dns.txt_records(domain).await {
            Ok(records) => records,
            Err(err) => {
                debug!(%domain, error = %err, "TXT resolution failed");
                return None;
            },
        };

        let pointer = manifest_pointer(&records)?;
        let content = self.fetcher.resolve(&pointer).await?;
        Some((pointer, content))
    }

    /// Try the three well-known paths in fixed order; first non-empty body
    /// of any content type wins.
    async fn probe_well_known(&self, domain: &str) -> Option<(String, ManifestContent)> {
        let scheme = scheme_for(domain);
        for suffix in WELL_KNOWN_SUFFIXES {
            let url = format!(
                "{scheme}://{domain}/.well-known/{}{suffix}",
                self.well_known_stem
            );
            if let Some(content) = self.fetcher.resolve(&url).await {
                return Some((url, content));
            }
        }
        None
    }
}

/// Use http for loopback hosts (test servers), https for everything else.
fn scheme_for(domain: &str) -> &'static str {
    if domain.starts_with("127.0.0.1") || domain.starts_with("localhost") {
        "http"
    } else {
        "https"
    }
}
