use crate::api::client::{ApiClient, ApiError};
use crate::model::group::{CrashGroup, Solution, SolutionEnvelope};
use crate::model::id::EntityId;
use crate::model::report::{CrashReport, CrashReportEnvelope};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// In-memory copy of what the crash service last told us.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Repository {
    pub crash_reports: Vec<CrashReport>,
    pub crash_groups: Vec<CrashGroup>,
    pub solutions: Vec<Solution>,
}

// on-disk layout, same envelopes as the wire format
#[derive(Debug, Serialize, Deserialize, Default)]
struct SnapshotFile {
    #[serde(default)]
    crash_reports: Vec<CrashReportEnvelope>,
    #[serde(default)]
    crash_groups: Vec<CrashGroup>,
    #[serde(default)]
    solutions: Vec<SolutionEnvelope>,
}

impl Repository {
    pub fn load(path: &Path) -> Result<Self> {
        let json_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file {:?}", path))?;

        let snapshot: SnapshotFile = serde_json::from_str(&json_content)
            .with_context(|| format!("Failed to parse snapshot file {:?}", path))?;

        let repo = Repository {
            crash_reports: snapshot
                .crash_reports
                .into_iter()
                .map(|e| e.crash_report)
                .collect(),
            crash_groups: snapshot.crash_groups,
            solutions: snapshot.solutions.into_iter().map(|e| e.solution).collect(),
        };

        info!(
            "Loaded snapshot {} with {} reports, {} groups, {} solutions",
            path.display(),
            repo.crash_reports.len(),
            repo.crash_groups.len(),
            repo.solutions.len()
        );

        Ok(repo)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = SnapshotFile {
            crash_reports: self
                .crash_reports
                .iter()
                .cloned()
                .map(|crash_report| CrashReportEnvelope { crash_report })
                .collect(),
            crash_groups: self.crash_groups.clone(),
            solutions: self
                .solutions
                .iter()
                .cloned()
                .map(|solution| SolutionEnvelope { solution })
                .collect(),
        };

        let json_content = serde_json::to_string_pretty(&snapshot)
            .with_context(|| "Failed to serialize snapshot")?;
        fs::write(path, json_content)
            .with_context(|| format!("Failed to write snapshot file {:?}", path))?;

        info!("Saved snapshot to {}", path.display());

        Ok(())
    }

    /// Replaces the report collection with what the service currently lists.
    pub async fn refresh_reports(&mut self, client: &ApiClient) -> Result<(), ApiError> {
        self.crash_reports = client.list_reports().await?;
        Ok(())
    }

    pub fn group(&self, group_id: &EntityId) -> Option<&CrashGroup> {
        self.crash_groups
            .iter()
            .find(|g| g.crash_group_id.as_ref() == Some(group_id))
    }

    /// Records a confirmed assignment. Returns false when the report is not in
    /// the snapshot.
    pub fn assign(&mut self, report_id: &EntityId, group_id: &EntityId) -> bool {
        let group_url = self.group(group_id).and_then(|g| g.crash_group_url.clone());

        match self
            .crash_reports
            .iter_mut()
            .find(|r| r.crash_report_id.as_ref() == Some(report_id))
        {
            Some(report) => {
                report.assign_to(group_id.clone(), group_url);
                true
            }
            None => {
                warn!("Crash report {} is not in the snapshot", report_id);
                false
            }
        }
    }

    pub fn push_report(&mut self, report: CrashReport) {
        self.crash_reports.push(report);
    }

    pub fn push_group(&mut self, group: CrashGroup) {
        self.crash_groups.push(group);
    }
}
