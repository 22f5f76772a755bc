//! Builds the ordered, de-duplicated candidate sequence for one discovery
//! run.
//!
//! Ordering is fixed: the declared domain identifier first (DNS, then
//! well-known), then the website's host, then the website's host with any
//! `www.` stripped. De-duplication is by (domain, probe-kind) so overlapping
//! inputs don't probe the same pair twice.

use std::collections::HashSet;

use url::Url;

use crate::types::{Candidate, ProbeKind};
use crate::{Error, Result};

/// Plan the candidate sequence from an organization's probeable inputs.
///
/// # Errors
///
/// Returns [`Error::NoCandidates`] when neither a domain identifier nor a
/// website link is available (or the website yields no usable host). Callers
/// treat this as a 400-class error and do not retry.
pub fn plan_candidates(
    domain_identifier: Option<&str>,
    website: Option<&str>,
) -> Result<Vec<Candidate>> {
    if domain_identifier.is_none() && website.is_none() {
        return Err(Error::NoCandidates);
    }

    let mut seen: HashSet<(String, ProbeKind)> = HashSet::new();
    let mut candidates = Vec::new();

    if let Some(domain) = domain_identifier {
        push_pair(&mut candidates, &mut seen, domain);
    }

    if let Some(website) = website {
        if let Some(host) = website_host(website) {
            push_pair(&mut candidates, &mut seen, &host);

            // "www." is stripped wherever it occurs, not just as a prefix.
            let stripped = host.replace("www.", "");
            if !stripped.is_empty() {
                push_pair(&mut candidates, &mut seen, &stripped);
            }
        }
    }

    if candidates.is_empty() {
        return Err(Error::NoCandidates);
    }
    Ok(candidates)
}

/// Extract the website's host, keeping an explicit port, prefixing `https://`
/// when the link carries no scheme.
fn website_host(website: &str) -> Option<String> {
    let href = if website.starts_with("http://") || website.starts_with("https://") {
        website.to_string()
    } else {
        format!("https://{website}")
    };

    let parsed = Url::parse(&href).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn push_pair(
    candidates: &mut Vec<Candidate>,
    seen: &mut HashSet<(String, ProbeKind)>,
    domain: &str,
) {
    for kind in [ProbeKind::Dns, ProbeKind::WellKnown] {
        if seen.insert((domain.to_string(), kind)) {
            candidates.push(Candidate::untested(domain.to_string(), kind));
        }
    }
}
