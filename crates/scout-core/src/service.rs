//! Request-scoped orchestration of discovery, queuing, and lake reads.
//!
//! [`ManifestService`] holds every collaborator handle (relational store,
//! lock substrate, work queue, object store, DNS resolver, HTTP client),
//! constructed once at process start and shared by reference across
//! requests. Each operation acquires the organization's advisory lock,
//! does its work, and releases the lock on every exit path.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::discovery::{Prober, TxtResolver, plan_candidates};
use crate::fetcher::{ContentFetcher, ManifestContent};
use crate::health::{HealthCheck, HealthReport, HealthStatus};
use crate::lake::{LakeDates, LakeListing, LakeManifest, build_listing, manifest_key, partition_prefix, resolve_dates};
use crate::lock::LockManager;
use crate::queue::{ensure_current, fetch_job};
use crate::store::{LakeStore, LockStore, OrganizationStore, WorkQueue};
use crate::types::{DiscoveryReport, FetchJob};
use crate::versioning::plan_version;
use crate::{Error, Result};

/// The discovery and versioning engine's operation surface.
pub struct ManifestService {
    store: Arc<dyn OrganizationStore>,
    locks: LockManager,
    queue: Arc<dyn WorkQueue>,
    lake: Arc<dyn LakeStore>,
    prober: Prober,
    config: Config,
}

impl ManifestService {
    /// Wire a service from its collaborators.
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be constructed.
    pub fn new(
        store: Arc<dyn OrganizationStore>,
        lock_store: Arc<dyn LockStore>,
        queue: Arc<dyn WorkQueue>,
        lake: Arc<dyn LakeStore>,
        dns: Arc<dyn TxtResolver>,
        config: Config,
    ) -> Result<Self> {
        let fetcher = ContentFetcher::with_timeout(config.http_timeout)?;
        let prober = Prober::new(dns, fetcher, config.well_known_stem.clone());
        let locks = LockManager::new(lock_store, config.lock_ttl);
        Ok(Self {
            store,
            locks,
            queue,
            lake,
            prober,
            config,
        })
    }

    /// Run manifest discovery for one organization.
    ///
    /// Probes the planned candidates, persists the annotated trace
    /// unconditionally, and mints a new version when the discovered source
    /// list differs canonically from the latest one.
    ///
    /// # Errors
    ///
    /// [`Error::Busy`] under lock contention, [`Error::NotFound`] for an
    /// unknown organization, [`Error::NoCandidates`] when the organization
    /// has nothing to probe (no trace is written), [`Error::Store`] on
    /// transaction failure.
    #[instrument(skip(self), fields(%organization_id))]
    pub async fn discover(&self, organization_id: Uuid) -> Result<DiscoveryReport> {
        let guard = self.locks.acquire(organization_id).await?;
        let result = self.discover_locked(organization_id).await;
        self.locks.release(&guard).await;
        result
    }

    async fn discover_locked(&self, organization_id: Uuid) -> Result<DiscoveryReport> {
        let organization = self
            .store
            .organization(organization_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("organization {organization_id}")))?;

        let domain_identifier = organization
            .metadata
            .domain_identifier()
            .map(std::string::ToString::to_string);
        let website = organization.metadata.website.clone();

        let candidates = plan_candidates(domain_identifier.as_deref(), website.as_deref())?;
        let discovery = self.prober.probe(candidates).await;

        let now = Utc::now();
        let today = now.date_naive();

        let sources = discovery
            .content
            .as_ref()
            .and_then(ManifestContent::sources)
            .filter(|sources| !sources.is_empty());

        let mut sources_processed = false;
        let mut new_version = None;
        if let Some(sources) = sources {
            sources_processed = true;
            let latest = self.store.latest_version(organization_id).await?;
            new_version = plan_version(organization_id, latest.as_ref(), sources, today);
        }

        self.store
            .record_discovery(organization_id, &discovery.trace, now, new_version.as_ref())
            .await?;

        info!(
            manifest_found = discovery.manifest_found(),
            sources_processed,
            new_version_created = new_version.is_some(),
            "discovery finished"
        );

        Ok(DiscoveryReport {
            organization_id,
            domain_identifier,
            website,
            manifest_found: discovery.manifest_found(),
            manifest_url: discovery.manifest_url,
            trace: discovery.trace,
            sources_processed,
            new_version_created: new_version.is_some(),
        })
    }

    /// Queue a fetch job for one source of a version, provided the version
    /// is still the organization's latest.
    ///
    /// # Errors
    ///
    /// [`Error::Busy`] under lock contention, [`Error::NotFound`] when the
    /// version or source row does not exist, [`Error::Stale`] when the
    /// version is no longer current, [`Error::Queue`] on push failure.
    #[instrument(skip(self), fields(%organization_id, %version_id, %source_id))]
    pub async fn queue_fetch(
        &self,
        organization_id: Uuid,
        version_id: Uuid,
        source_id: Uuid,
        source_path: &str,
    ) -> Result<FetchJob> {
        let guard = self.locks.acquire(organization_id).await?;
        let result = self
            .queue_fetch_locked(organization_id, version_id, source_id, source_path)
            .await;
        self.locks.release(&guard).await;
        result
    }

    async fn queue_fetch_locked(
        &self,
        organization_id: Uuid,
        version_id: Uuid,
        source_id: Uuid,
        source_path: &str,
    ) -> Result<FetchJob> {
        let requested = self
            .store
            .version(organization_id, version_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "version {version_id} for organization {organization_id}"
                ))
            })?;

        self.store
            .source(version_id, source_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("source {source_id} in version {version_id}"))
            })?;

        let latest = self
            .store
            .latest_version(organization_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("no versions for organization {organization_id}"))
            })?;

        ensure_current(&requested, &latest)?;

        let job = fetch_job(organization_id, version_id, source_id, source_path, Utc::now());
        let payload = serde_json::to_string(&job)?;
        self.queue.push(&self.config.queue_name, &payload).await?;

        info!(queue = %self.config.queue_name, "fetch job queued");
        Ok(job)
    }

    /// List the date partitions recorded in a source's lake manifest object.
    pub async fn lake_dates(
        &self,
        organization_id: Uuid,
        version_id: Uuid,
        source_id: Uuid,
    ) -> Result<LakeDates> {
        let manifest = self
            .lake_manifest(organization_id, version_id, source_id)
            .await?;
        Ok(resolve_dates(&manifest))
    }

    /// List the files of one date partition. Without an explicit date, the
    /// manifest object's `latest_date` decides which partition is listed.
    pub async fn lake_files(
        &self,
        organization_id: Uuid,
        version_id: Uuid,
        source_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<LakeListing> {
        let (date, date_from_manifest) = match date {
            Some(date) => (date, false),
            None => {
                let manifest = self
                    .lake_manifest(organization_id, version_id, source_id)
                    .await?;
                let latest = resolve_dates(&manifest).latest_date.ok_or_else(|| {
                    Error::NotFound(format!(
                        "no latest date in lake manifest for source {source_id}"
                    ))
                })?;
                let parsed = NaiveDate::parse_from_str(&latest, "%Y-%m-%d").map_err(|err| {
                    Error::Store(format!(
                        "invalid latest_date {latest:?} in lake manifest for source {source_id}: {err}"
                    ))
                })?;
                (parsed, true)
            },
        };

        let prefix = partition_prefix(
            &self.config.lake_prefix,
            organization_id,
            version_id,
            source_id,
            date,
        );
        let objects = self.lake.list(&prefix).await?;
        Ok(build_listing(
            date,
            date_from_manifest,
            objects,
            Utc::now().date_naive(),
        ))
    }

    async fn lake_manifest(
        &self,
        organization_id: Uuid,
        version_id: Uuid,
        source_id: Uuid,
    ) -> Result<LakeManifest> {
        let key = manifest_key(&self.config.lake_prefix, organization_id, version_id, source_id);
        let body = self
            .lake
            .get(&key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("lake manifest {key}")))?;
        serde_json::from_str(&body)
            .map_err(|err| Error::Store(format!("invalid lake manifest {key}: {err}")))
    }

    /// Probe the relational store and report liveness.
    pub async fn health(&self) -> HealthReport {
        let store = match self.store.ping().await {
            Ok(()) => HealthCheck {
                name: "store".to_string(),
                status: HealthStatus::Ok,
                detail: None,
            },
            Err(err) => HealthCheck {
                name: "store".to_string(),
                status: HealthStatus::Degraded,
                detail: Some(err.to_string()),
            },
        };
        HealthReport::from_checks(vec![store])
    }
}
