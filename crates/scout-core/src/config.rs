//! Configuration for the discovery engine.
//!
//! Defaults live in code; a TOML file can override them and `SCOUT_*`
//! environment variables override the file. There is no per-user directory
//! lookup: services pass an explicit path or rely on `SCOUT_CONFIG`.
//!
//! ```toml
//! http_timeout_secs = 30
//! lock_ttl_secs = 60
//! well_known_stem = "source-manifest"
//! queue_name = "source_fetch_queue"
//! lake_prefix = "datalake"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Runtime configuration for [`crate::ManifestService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Per-call bound on outbound manifest fetches.
    pub http_timeout: Duration,
    /// Expiry of the per-organization advisory lock key.
    pub lock_ttl: Duration,
    /// File stem probed under `/.well-known/` (unsuffixed, `.json`, `.yaml`).
    pub well_known_stem: String,
    /// Name of the fixed work queue fetch jobs are pushed onto.
    pub queue_name: String,
    /// Root prefix of the date-partitioned object store.
    pub lake_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(30),
            lock_ttl: Duration::from_secs(60),
            well_known_stem: "source-manifest".to_string(),
            queue_name: "source_fetch_queue".to_string(),
            lake_prefix: "datalake".to_string(),
        }
    }
}

/// On-disk representation; every field optional so partial files work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    http_timeout_secs: Option<u64>,
    lock_ttl_secs: Option<u64>,
    well_known_stem: Option<String>,
    queue_name: Option<String>,
    lake_prefix: Option<String>,
}

impl Config {
    /// Load configuration: defaults, then the file named by `SCOUT_CONFIG`
    /// (if set), then `SCOUT_*` environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("SCOUT_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a TOML file, with defaults for absent keys.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        let file: ConfigFile = toml::from_str(&raw)?;
        let defaults = Self::default();
        Ok(Self {
            http_timeout: file
                .http_timeout_secs
                .map_or(defaults.http_timeout, Duration::from_secs),
            lock_ttl: file
                .lock_ttl_secs
                .map_or(defaults.lock_ttl, Duration::from_secs),
            well_known_stem: file.well_known_stem.unwrap_or(defaults.well_known_stem),
            queue_name: file.queue_name.unwrap_or(defaults.queue_name),
            lake_prefix: file.lake_prefix.unwrap_or(defaults.lake_prefix),
        })
    }

    /// Apply `SCOUT_*` overrides from an arbitrary lookup. Unparseable
    /// numeric values are ignored rather than fatal.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secs) = lookup("SCOUT_HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.http_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = lookup("SCOUT_LOCK_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.lock_ttl = Duration::from_secs(secs);
        }
        if let Some(stem) = lookup("SCOUT_WELL_KNOWN_STEM") {
            self.well_known_stem = stem;
        }
        if let Some(queue) = lookup("SCOUT_QUEUE_NAME") {
            self.queue_name = queue;
        }
        if let Some(prefix) = lookup("SCOUT_LAKE_PREFIX") {
            self.lake_prefix = prefix;
        }
    }
}
