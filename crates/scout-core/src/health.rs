//! Liveness reporting for the engine's collaborators.

use serde::Serialize;

/// Aggregate or per-check status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Collaborator responded.
    Ok,
    /// Collaborator failed its probe.
    Degraded,
}

/// Individual collaborator check result.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Collaborator name, e.g. `store`.
    pub name: String,
    /// Probe outcome.
    pub status: HealthStatus,
    /// Failure detail, when degraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Overall health report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Worst status across all checks.
    pub status: HealthStatus,
    /// Individual check results.
    pub checks: Vec<HealthCheck>,
}

impl HealthReport {
    /// Build a report whose overall status is the worst of its checks.
    #[must_use]
    pub fn from_checks(checks: Vec<HealthCheck>) -> Self {
        let status = if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        Self { status, checks }
    }
}
