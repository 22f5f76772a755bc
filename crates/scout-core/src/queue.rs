//! Version-freshness gate and fetch-job construction for the queue
//! operation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{FetchJob, SourceVersion};
use crate::{Error, Result};

/// Status stamped on every freshly queued job.
pub const QUEUED_STATUS: &str = "queued";

/// Reject queue requests referencing a version that is no longer the latest.
///
/// Comparison is by version identity only; the (date, sequence) stamps are
/// never compared, they feed the diagnostic echo inside [`Error::Stale`].
pub fn ensure_current(requested: &SourceVersion, latest: &SourceVersion) -> Result<()> {
    if latest.id != requested.id {
        return Err(Error::Stale {
            requested: requested.stamp(),
            latest: latest.stamp(),
        });
    }
    Ok(())
}

/// Build the job record pushed onto the work queue.
#[must_use]
pub fn fetch_job(
    organization_id: Uuid,
    version_id: Uuid,
    source_id: Uuid,
    source_path: &str,
    queued_at: DateTime<Utc>,
) -> FetchJob {
    FetchJob {
        organization_id,
        version_id,
        source_id,
        source_path: source_path.to_string(),
        queued_at,
        status: QUEUED_STATUS.to_string(),
    }
}
