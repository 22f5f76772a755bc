//! Error types and handling for scout-core operations.
//!
//! All fallible operations in this crate return [`Result<T>`]. The taxonomy
//! distinguishes caller mistakes (`NoCandidates`, `NotFound`, `Stale`),
//! contention (`Busy`), upstream faults that probing absorbs into the
//! candidate trace (`Network`, `Upstream`, `Parse`), and fatal store/queue
//! failures that roll the current operation back.

use thiserror::Error;
use uuid::Uuid;

use crate::types::VersionStamp;

/// The main error type for scout-core operations.
///
/// Only a subset of variants ever reaches an operation's caller: lock
/// contention, staleness, missing rows, missing probe inputs, and storage
/// failures. Per-candidate network and parse faults are folded into the
/// discovery trace by the prober and resolver instead of being raised.
#[derive(Error, Debug)]
pub enum Error {
    /// The organization has neither a domain identifier nor a website link,
    /// so no discovery candidates can be planned.
    ///
    /// This is a caller/data problem (400-class); retrying cannot help until
    /// the organization's metadata changes.
    #[error("organization has neither a domain identifier nor a website link to probe")]
    NoCandidates,

    /// A referenced organization, version, or source row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Another discovery or queue operation holds the organization's
    /// advisory lock. Callers should retry later, not immediately.
    #[error("organization {0} is currently being processed")]
    Busy(Uuid),

    /// The caller referenced a version that is no longer the organization's
    /// latest. Both stamps are carried so the caller can display what it
    /// asked for versus what now exists.
    #[error("stale version reference: requested {requested}, latest is {latest}")]
    Stale {
        /// Stamp of the version the caller asked for.
        requested: VersionStamp,
        /// Stamp of the organization's true latest version.
        latest: VersionStamp,
    },

    /// Relational store failure. The surrounding transaction is rolled back
    /// and nothing of the current operation is persisted.
    #[error("store error: {0}")]
    Store(String),

    /// Work queue push failure.
    #[error("queue error: {0}")]
    Queue(String),

    /// HTTP-level failure while fetching a manifest URL.
    ///
    /// Inside the prober this is absorbed as that candidate's failure; it is
    /// never fatal for a discovery operation.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-HTTP upstream failure, e.g. DNS resolution errors. Absorbed into
    /// the candidate trace like [`Error::Network`].
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    /// Structured-content decode failure. The content resolver falls through
    /// to opaque-content handling instead of surfacing this.
    #[error("parse error: {0}")]
    Parse(String),

    /// Serialization or deserialization failed outside of manifest parsing
    /// (job payloads, stored traces).
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration is invalid or inaccessible.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl Error {
    /// HTTP-equivalent status code for this error.
    ///
    /// Embedders exposing these operations over HTTP map the taxonomy with
    /// this helper: `Busy` is 423 (locked), `Stale` is 426 (the caller must
    /// refresh its version reference before resubmitting).
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::NoCandidates => 400,
            Self::NotFound(_) => 404,
            Self::Busy(_) => 423,
            Self::Stale { .. } => 426,
            Self::Network(_) | Self::Upstream(_) => 502,
            _ => 500,
        }
    }

    /// True when the failure is lock contention and a later retry may
    /// succeed without any caller-side change.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

/// Result type alias for scout-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn http_status_maps_taxonomy() {
        let stale = Error::Stale {
            requested: VersionStamp {
                date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                sequence: 1,
            },
            latest: VersionStamp {
                date: NaiveDate::from_ymd_opt(2026, 8, 2).unwrap(),
                sequence: 3,
            },
        };

        assert_eq!(Error::NoCandidates.http_status(), 400);
        assert_eq!(Error::NotFound("x".into()).http_status(), 404);
        assert_eq!(Error::Busy(Uuid::new_v4()).http_status(), 423);
        assert_eq!(stale.http_status(), 426);
        assert_eq!(Error::Store("boom".into()).http_status(), 500);
        assert_eq!(Error::Upstream("dns".into()).http_status(), 502);
    }

    #[test]
    fn stale_display_carries_both_stamps() {
        let err = Error::Stale {
            requested: VersionStamp {
                date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                sequence: 2,
            },
            latest: VersionStamp {
                date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
                sequence: 1,
            },
        };
        let rendered = err.to_string();
        assert!(rendered.contains("2026-08-01"));
        assert!(rendered.contains("2026-08-05"));
    }

    #[test]
    fn busy_predicate() {
        assert!(Error::Busy(Uuid::new_v4()).is_busy());
        assert!(!Error::NoCandidates.is_busy());
    }
}
