//! In-memory collaborator implementations.
//!
//! These back the test suites and let embedders run the engine without
//! external infrastructure. Each guards its state with a `std::sync::Mutex`
//! held only for the duration of a synchronous section, never across an
//! await point.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{Candidate, Organization, SourceRecord, SourceVersion};
use crate::versioning::NewVersion;
use crate::{Error, Result};

use super::{LakeStore, LockStore, ObjectInfo, OrganizationStore, WorkQueue};

fn unpoisoned<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct StoreInner {
    organizations: HashMap<Uuid, Organization>,
    versions: Vec<SourceVersion>,
    sources: Vec<SourceRecord>,
}

/// In-memory relational store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an organization row.
    pub fn insert_organization(&self, organization: Organization) {
        unpoisoned(&self.inner)
            .organizations
            .insert(organization.id, organization);
    }

    /// All version rows of an organization, insertion order.
    #[must_use]
    pub fn versions_for(&self, organization_id: Uuid) -> Vec<SourceVersion> {
        unpoisoned(&self.inner)
            .versions
            .iter()
            .filter(|v| v.organization_id == organization_id)
            .cloned()
            .collect()
    }

    /// All source rows of a version.
    #[must_use]
    pub fn sources_for(&self, version_id: Uuid) -> Vec<SourceRecord> {
        unpoisoned(&self.inner)
            .sources
            .iter()
            .filter(|s| s.version_id == version_id)
            .cloned()
            .collect()
    }
}

fn latest_of(inner: &StoreInner, organization_id: Uuid) -> Option<SourceVersion> {
    inner
        .versions
        .iter()
        .filter(|v| v.organization_id == organization_id)
        .max_by_key(|v| (v.version_date, v.sequence))
        .cloned()
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn organization(&self, id: Uuid) -> Result<Option<Organization>> {
        Ok(unpoisoned(&self.inner).organizations.get(&id).cloned())
    }

    async fn latest_version(&self, organization_id: Uuid) -> Result<Option<SourceVersion>> {
        Ok(latest_of(&unpoisoned(&self.inner), organization_id))
    }

    async fn version(
        &self,
        organization_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<SourceVersion>> {
        Ok(unpoisoned(&self.inner)
            .versions
            .iter()
            .find(|v| v.organization_id == organization_id && v.id == version_id)
            .cloned())
    }

    async fn source(&self, version_id: Uuid, source_id: Uuid) -> Result<Option<SourceRecord>> {
        Ok(unpoisoned(&self.inner)
            .sources
            .iter()
            .find(|s| s.version_id == version_id && s.id == source_id)
            .cloned())
    }

    async fn record_discovery(
        &self,
        organization_id: Uuid,
        trace: &[Candidate],
        pulled_at: DateTime<Utc>,
        new_version: Option<&NewVersion>,
    ) -> Result<()> {
        let mut inner = unpoisoned(&self.inner);

        // Validate before mutating anything so a failure leaves no partial
        // write, mirroring the single-transaction rule of the real store.
        if !inner.organizations.contains_key(&organization_id) {
            return Err(Error::Store(format!(
                "organization {organization_id} vanished during discovery"
            )));
        }

        if let Some(version) = new_version {
            inner.versions.push(SourceVersion {
                id: version.id,
                organization_id: version.organization_id,
                version_date: version.date,
                sequence: version.sequence,
                raw_sources: version.raw_sources.clone(),
                normalized_sources: version.normalized_sources.clone(),
                created_at: pulled_at,
            });
            inner.sources.extend(version.source_rows.iter().cloned());
        }

        if let Some(organization) = inner.organizations.get_mut(&organization_id) {
            organization.manifest_trace = Some(trace.to_vec());
            organization.last_manifest_pull = Some(pulled_at);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory lock substrate with real TTL expiry.
#[derive(Default)]
pub struct MemoryLockStore {
    keys: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryLockStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn put_if_absent(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        let mut keys = unpoisoned(&self.keys);
        let now = Instant::now();
        keys.retain(|_, (_, expires)| *expires > now);

        if keys.contains_key(key) {
            return Ok(false);
        }
        keys.insert(key.to_string(), (token.to_string(), now + ttl));
        Ok(true)
    }

    async fn delete_if_matches(&self, key: &str, token: &str) -> Result<bool> {
        let mut keys = unpoisoned(&self.keys);
        let now = Instant::now();
        keys.retain(|_, (_, expires)| *expires > now);

        match keys.get(key) {
            Some((held, _)) if held == token => {
                keys.remove(key);
                Ok(true)
            },
            _ => Ok(false),
        }
    }
}

/// In-memory FIFO queue, with drain helpers for tests.
#[derive(Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued payloads.
    #[must_use]
    pub fn len(&self, queue: &str) -> usize {
        unpoisoned(&self.queues).get(queue).map_or(0, Vec::len)
    }

    /// True when the named queue holds no payloads.
    #[must_use]
    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }

    /// Remove and return all queued payloads, oldest first.
    #[must_use]
    pub fn drain(&self, queue: &str) -> Vec<String> {
        unpoisoned(&self.queues)
            .get_mut(queue)
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn push(&self, queue: &str, payload: &str) -> Result<()> {
        unpoisoned(&self.queues)
            .entry(queue.to_string())
            .or_default()
            .push(payload.to_string());
        Ok(())
    }
}

/// In-memory object store.
#[derive(Default)]
pub struct MemoryLakeStore {
    objects: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryLakeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object with an explicit last-modified timestamp.
    pub fn put_object(&self, key: &str, body: &str, last_modified: DateTime<Utc>) {
        unpoisoned(&self.objects).insert(key.to_string(), (body.to_string(), last_modified));
    }
}

#[async_trait]
impl LakeStore for MemoryLakeStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(unpoisoned(&self.objects)
            .get(key)
            .map(|(body, _)| body.clone()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>> {
        Ok(unpoisoned(&self.objects)
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, (body, last_modified))| ObjectInfo {
                key: key.clone(),
                size: body.len() as u64,
                last_modified: *last_modified,
            })
            .collect())
    }
}
