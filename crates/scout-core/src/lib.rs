//! # scout-core
//!
//! Core engine for locating, validating, and versioning the source
//! manifests that external organizations publish about their data sources.
//!
//! ## Architecture
//!
//! Discovery walks an ordered candidate sequence of DNS-TXT pointers and
//! `/.well-known/` paths derived from an organization's domain identifier
//! and website, stopping at the first URL that yields content. Whatever is
//! found is classified (JSON, YAML, or opaque) and compared canonically
//! against the organization's latest persisted version; a material change
//! mints a new immutable, sequence-numbered version with normalized source
//! rows. Per-organization advisory locks (atomic set-if-absent with TTL and
//! fencing tokens) keep concurrent discovery and queue operations from
//! overlapping.
//!
//! External systems (the relational store, the lock substrate, the work
//! queue, and the object store) are consumed through traits in [`store`]
//! and injected into [`ManifestService`] once at process start. In-memory
//! implementations back the test suites.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use scout_core::{
//!     Config, HickoryTxtResolver, ManifestService, MemoryLakeStore, MemoryLockStore,
//!     MemoryQueue, MemoryStore,
//! };
//!
//! # async fn example() -> scout_core::Result<()> {
//! let service = ManifestService::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryLockStore::new()),
//!     Arc::new(MemoryQueue::new()),
//!     Arc::new(MemoryLakeStore::new()),
//!     Arc::new(HickoryTxtResolver::new()),
//!     Config::default(),
//! )?;
//!
//! let report = service.discover(uuid::Uuid::new_v4()).await?;
//! println!("manifest found: {}", report.manifest_found);
//! # Ok(())
//! # }
//! ```

/// Runtime configuration with TOML and environment overrides
pub mod config;
/// Candidate planning and ordered fallback probing
pub mod discovery;
/// Error types and result aliases
pub mod error;
/// HTTP fetching and manifest content classification
pub mod fetcher;
/// Liveness reporting
pub mod health;
/// Read-only listings over the date-partitioned object store
pub mod lake;
/// Per-organization advisory locking
pub mod lock;
/// Version-freshness gate and fetch-job construction
pub mod queue;
/// Request-scoped orchestration of discovery and queuing
pub mod service;
/// Collaborator traits and in-memory implementations
pub mod store;
/// Core data types and structures
pub mod types;
/// Version diffing, sequencing, and source normalization
pub mod versioning;

// Re-export commonly used types
pub use config::Config;
pub use discovery::{
    Discovery, HickoryTxtResolver, MANIFEST_MARKER, Prober, TxtResolver, manifest_pointer,
    plan_candidates,
};
pub use error::{Error, Result};
pub use fetcher::{ContentFetcher, ManifestContent, ManifestFormat};
pub use health::{HealthCheck, HealthReport, HealthStatus};
pub use lake::{LakeDates, LakeFile, LakeListing, LakeManifest};
pub use lock::{LockGuard, LockManager};
pub use queue::ensure_current;
pub use service::ManifestService;
pub use store::{
    LakeStore, LockStore, MemoryLakeStore, MemoryLockStore, MemoryQueue, MemoryStore, ObjectInfo,
    OrganizationStore, WorkQueue,
};
pub use types::*;
pub use versioning::{NewVersion, canonical_digest, canonical_json, plan_version};
