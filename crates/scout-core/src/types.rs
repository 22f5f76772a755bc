use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identifier scheme whose value is a probeable DNS domain.
pub const DOMAIN_SCHEME: &str = "domain";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentifier {
    pub scheme: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgMetadata {
    #[serde(default)]
    pub identifiers: Vec<ExternalIdentifier>,
    #[serde(default)]
    pub website: Option<String>,
}

impl OrgMetadata {
    /// First identifier carrying the [`DOMAIN_SCHEME`], if any.
    #[must_use]
    pub fn domain_identifier(&self) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|id| id.scheme == DOMAIN_SCHEME)
            .map(|id| id.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    /// Identifiers assigned by external registries; opaque to discovery.
    #[serde(default)]
    pub registry_ids: Vec<String>,
    pub metadata: OrgMetadata,
    /// Full candidate trace of the last discovery run, winners and losers.
    pub manifest_trace: Option<Vec<Candidate>>,
    pub last_registry_pull: Option<DateTime<Utc>>,
    pub last_manifest_pull: Option<DateTime<Utc>>,
}

/// How a discovery candidate is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeKind {
    /// TXT-record lookup carrying a manifest pointer.
    #[serde(rename = "DNS")]
    Dns,
    /// Fixed paths under `/.well-known/`.
    #[serde(rename = ".well-known")]
    WellKnown,
}

/// One (domain, probe-kind) pair tried during manifest discovery.
///
/// `check` is `None` until the candidate is probed and stays `None` for
/// candidates skipped because an earlier one succeeded; `path` holds the
/// resolved manifest URL on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub domain: String,
    #[serde(rename = "type")]
    pub kind: ProbeKind,
    pub check: Option<bool>,
    pub path: Option<String>,
}

impl Candidate {
    #[must_use]
    pub const fn untested(domain: String, kind: ProbeKind) -> Self {
        Self {
            domain,
            kind,
            check: None,
            path: None,
        }
    }
}

/// An immutable snapshot of an organization's source list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceVersion {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub version_date: NaiveDate,
    /// Monotonic per (organization, date), starting at 1.
    pub sequence: u32,
    /// The source list exactly as received.
    pub raw_sources: Vec<Value>,
    /// Copy of the raw list with a `source_id` assigned to every entry.
    pub normalized_sources: Vec<Value>,
    pub created_at: DateTime<Utc>,
}

impl SourceVersion {
    #[must_use]
    pub const fn stamp(&self) -> VersionStamp {
        VersionStamp {
            date: self.version_date,
            sequence: self.sequence,
        }
    }
}

/// (date, sequence) pair identifying a version for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionStamp {
    pub date: NaiveDate,
    pub sequence: u32,
}

impl std::fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.date, self.sequence)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: Uuid,
    pub version_id: Uuid,
    pub path: String,
    pub source_type: String,
    pub declared_version: Option<String>,
    pub name: String,
}

/// Job record pushed onto the work queue for the out-of-process worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchJob {
    pub organization_id: Uuid,
    pub version_id: Uuid,
    pub source_id: Uuid,
    pub source_path: String,
    pub queued_at: DateTime<Utc>,
    pub status: String,
}

/// Outcome of one discovery operation.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub organization_id: Uuid,
    pub domain_identifier: Option<String>,
    pub website: Option<String>,
    pub manifest_found: bool,
    pub manifest_url: Option<String>,
    pub trace: Vec<Candidate>,
    pub sources_processed: bool,
    pub new_version_created: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trace_serializes_to_contract_shape() {
        let candidate = Candidate {
            domain: "example.edu".to_string(),
            kind: ProbeKind::WellKnown,
            check: Some(true),
            path: Some("https://example.edu/.well-known/source-manifest".to_string()),
        };

        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["domain"], "example.edu");
        assert_eq!(json["type"], ".well-known");
        assert_eq!(json["check"], true);
        assert_eq!(
            json["path"],
            "https://example.edu/.well-known/source-manifest"
        );
    }

    #[test]
    fn skipped_candidate_has_null_check() {
        let candidate = Candidate::untested("example.edu".to_string(), ProbeKind::Dns);
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["type"], "DNS");
        assert!(json["check"].is_null());
        assert!(json["path"].is_null());
    }

    #[test]
    fn domain_identifier_picks_domain_scheme() {
        let metadata = OrgMetadata {
            identifiers: vec![
                ExternalIdentifier {
                    scheme: "registry".to_string(),
                    value: "R-123".to_string(),
                },
                ExternalIdentifier {
                    scheme: DOMAIN_SCHEME.to_string(),
                    value: "example.edu".to_string(),
                },
            ],
            website: None,
        };
        assert_eq!(metadata.domain_identifier(), Some("example.edu"));
    }

    #[test]
    fn domain_identifier_absent() {
        let metadata = OrgMetadata::default();
        assert_eq!(metadata.domain_identifier(), None);
    }

    #[test]
    fn version_stamp_display() {
        let stamp = VersionStamp {
            date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
            sequence: 3,
        };
        assert_eq!(stamp.to_string(), "2026-08-05 #3");
    }
}
