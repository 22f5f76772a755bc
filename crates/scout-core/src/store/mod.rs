//! Collaborator interfaces: relational store, lock substrate, work queue,
//! and object store.
//!
//! The engine owns none of these systems; it consumes them through the
//! traits below, constructed once and injected into
//! [`crate::ManifestService`]. The [`memory`] module provides in-process
//! implementations used by tests and embedders that want the engine without
//! external infrastructure.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Result;
use crate::types::{Candidate, Organization, SourceRecord, SourceVersion};
use crate::versioning::NewVersion;

/// In-process collaborator implementations.
pub mod memory;

pub use memory::{MemoryLakeStore, MemoryLockStore, MemoryQueue, MemoryStore};

/// Relational store holding organizations, version history, and source rows.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Look up one organization.
    async fn organization(&self, id: Uuid) -> Result<Option<Organization>>;

    /// The organization's latest version: highest date, then highest
    /// sequence.
    async fn latest_version(&self, organization_id: Uuid) -> Result<Option<SourceVersion>>;

    /// A specific version of an organization.
    async fn version(
        &self,
        organization_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<SourceVersion>>;

    /// A source row belonging to a version.
    async fn source(&self, version_id: Uuid, source_id: Uuid) -> Result<Option<SourceRecord>>;

    /// Apply one discovery's writes atomically: the trace and pull timestamp
    /// on the organization row, plus (when present) the new version and its
    /// source rows. Either everything is persisted or nothing is.
    async fn record_discovery(
        &self,
        organization_id: Uuid,
        trace: &[Candidate],
        pulled_at: DateTime<Utc>,
        new_version: Option<&NewVersion>,
    ) -> Result<()>;

    /// Liveness probe for health reporting.
    async fn ping(&self) -> Result<()>;
}

/// Ephemeral key/value substrate for advisory locks.
///
/// Both operations are atomic at the substrate: `put_if_absent` is a
/// conditional put (Redis `SET NX EX`-equivalent), `delete_if_matches` only
/// removes the key while it still holds the caller's token.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Write `key` with `token` and expiry unless the key already exists.
    /// Returns whether the write happened.
    async fn put_if_absent(&self, key: &str, token: &str, ttl: Duration) -> Result<bool>;

    /// Delete `key` only if its current value is `token`. Returns whether a
    /// deletion happened.
    async fn delete_if_matches(&self, key: &str, token: &str) -> Result<bool>;
}

/// FIFO work queue; the engine only ever appends.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Append a payload to the named queue.
    async fn push(&self, queue: &str, payload: &str) -> Result<()>;
}

/// Metadata of one object in the lake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Full object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last-modified timestamp reported by the store.
    pub last_modified: DateTime<Utc>,
}

/// Read-only view of the date-partitioned object store.
#[async_trait]
pub trait LakeStore: Send + Sync {
    /// Fetch an object's body as text, `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// List objects under a key prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>>;
}
