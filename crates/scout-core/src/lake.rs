//! Read-only listings over the date-partitioned object store.
//!
//! Files land in the lake under a deterministic layout,
//! `{prefix}/{organization}/{version}/{source}/{date}/...`, written by the
//! out-of-process worker. This engine never writes there; it only reads the
//! small per-source manifest object and lists date partitions for callers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::ObjectInfo;

/// File name of the per-source manifest object.
pub const LAKE_MANIFEST_NAME: &str = "source_manifest.json";

/// The worker-maintained manifest object describing a source's partitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LakeManifest {
    /// Dates with data, as `YYYY-MM-DD` strings.
    #[serde(default)]
    pub dates: Option<Vec<String>>,
    /// The most recent date with data.
    #[serde(default)]
    pub latest_date: Option<String>,
}

/// Resolved date listing for a source.
#[derive(Debug, Clone, Serialize)]
pub struct LakeDates {
    /// All known dates, newest first.
    pub dates: Vec<String>,
    /// The newest date, when one can be determined.
    pub latest_date: Option<String>,
}

/// One listed lake file.
#[derive(Debug, Clone, Serialize)]
pub struct LakeFile {
    /// Full object key.
    pub full_path: String,
    /// Final path segment.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Store-reported last-modified timestamp.
    pub last_modified: DateTime<Utc>,
    /// True only on the newest file of a listing for today's date.
    pub push_status: bool,
}

/// Files of one date partition, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct LakeListing {
    /// The date partition that was listed.
    pub date: NaiveDate,
    /// Whether the date came from the request or the manifest object.
    pub date_from_manifest: bool,
    /// The partition's files sorted by last-modified, ascending.
    pub files: Vec<LakeFile>,
}

/// Key of a source's manifest object.
#[must_use]
pub fn manifest_key(prefix: &str, organization: Uuid, version: Uuid, source: Uuid) -> String {
    format!("{prefix}/{organization}/{version}/{source}/{LAKE_MANIFEST_NAME}")
}

/// Prefix of one date partition's objects.
#[must_use]
pub fn partition_prefix(
    prefix: &str,
    organization: Uuid,
    version: Uuid,
    source: Uuid,
    date: NaiveDate,
) -> String {
    format!("{prefix}/{organization}/{version}/{source}/{date}/")
}

/// Resolve the date listing from a manifest object.
///
/// An explicit `latest_date` always wins; otherwise the maximum of `dates`
/// stands in. A manifest with a `latest_date` but no `dates` list is treated
/// as having that single date.
#[must_use]
pub fn resolve_dates(manifest: &LakeManifest) -> LakeDates {
    let mut dates = match (&manifest.dates, &manifest.latest_date) {
        (Some(dates), _) => dates.clone(),
        (None, Some(latest)) => vec![latest.clone()],
        (None, None) => Vec::new(),
    };
    dates.sort_by(|a, b| b.cmp(a));

    let latest_date = manifest
        .latest_date
        .clone()
        .or_else(|| dates.first().cloned());

    LakeDates { dates, latest_date }
}

/// Turn listed objects into an ordered file listing, flagging the newest
/// file when the partition is today's.
#[must_use]
pub fn build_listing(
    date: NaiveDate,
    date_from_manifest: bool,
    objects: Vec<ObjectInfo>,
    today: NaiveDate,
) -> LakeListing {
    let mut files: Vec<LakeFile> = objects
        .into_iter()
        .map(|object| {
            let filename = object
                .key
                .rsplit('/')
                .next()
                .unwrap_or(object.key.as_str())
                .to_string();
            LakeFile {
                full_path: object.key,
                filename,
                size: object.size,
                last_modified: object.last_modified,
                push_status: false,
            }
        })
        .collect();
    files.sort_by_key(|file| file.last_modified);

    if date == today {
        if let Some(newest) = files.last_mut() {
            newest.push_status = true;
        }
    }

    LakeListing {
        date,
        date_from_manifest,
        files,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn manifest_key_layout() {
        let (org, version, source) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            manifest_key("datalake", org, version, source),
            format!("datalake/{org}/{version}/{source}/source_manifest.json")
        );
    }

    #[test]
    fn partition_prefix_ends_with_date_segment() {
        let (org, version, source) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let prefix = partition_prefix("datalake", org, version, source, day(2026, 8, 5));
        assert!(prefix.ends_with("/2026-08-05/"));
    }

    #[test]
    fn explicit_latest_date_wins() {
        let manifest = LakeManifest {
            dates: Some(vec!["2026-08-01".to_string(), "2026-08-03".to_string()]),
            latest_date: Some("2026-08-02".to_string()),
        };
        let resolved = resolve_dates(&manifest);
        assert_eq!(resolved.latest_date.as_deref(), Some("2026-08-02"));
        assert_eq!(resolved.dates, vec!["2026-08-03", "2026-08-01"]);
    }

    #[test]
    fn latest_falls_back_to_max_date() {
        let manifest = LakeManifest {
            dates: Some(vec!["2026-08-01".to_string(), "2026-08-03".to_string()]),
            latest_date: None,
        };
        assert_eq!(
            resolve_dates(&manifest).latest_date.as_deref(),
            Some("2026-08-03")
        );
    }

    #[test]
    fn lone_latest_date_becomes_the_listing() {
        let manifest = LakeManifest {
            dates: None,
            latest_date: Some("2026-08-05".to_string()),
        };
        let resolved = resolve_dates(&manifest);
        assert_eq!(resolved.dates, vec!["2026-08-05"]);
    }

    #[test]
    fn empty_manifest_has_no_dates() {
        let resolved = resolve_dates(&LakeManifest::default());
        assert!(resolved.dates.is_empty());
        assert!(resolved.latest_date.is_none());
    }

    #[test]
    fn listing_sorts_and_flags_newest_today() {
        let t0 = Utc.with_ymd_and_hms(2026, 8, 5, 8, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap();
        let objects = vec![
            ObjectInfo {
                key: "datalake/o/v/s/2026-08-05/b.rdf".to_string(),
                size: 2,
                last_modified: t1,
            },
            ObjectInfo {
                key: "datalake/o/v/s/2026-08-05/a.rdf".to_string(),
                size: 1,
                last_modified: t0,
            },
        ];

        let listing = build_listing(day(2026, 8, 5), false, objects, day(2026, 8, 5));
        assert_eq!(listing.files[0].filename, "a.rdf");
        assert_eq!(listing.files[1].filename, "b.rdf");
        assert!(!listing.files[0].push_status);
        assert!(listing.files[1].push_status);
    }

    #[test]
    fn listing_for_past_date_flags_nothing() {
        let t0 = Utc.with_ymd_and_hms(2026, 8, 4, 8, 0, 0).unwrap();
        let objects = vec![ObjectInfo {
            key: "datalake/o/v/s/2026-08-04/a.rdf".to_string(),
            size: 1,
            last_modified: t0,
        }];

        let listing = build_listing(day(2026, 8, 4), true, objects, day(2026, 8, 5));
        assert!(listing.files.iter().all(|f| !f.push_status));
        assert!(listing.date_from_manifest);
    }
}
