use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use humansize::{format_size, DECIMAL};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::runner::{EncodeOutcome, EncodeStatus};

/// Persistent record of one sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub input: PathBuf,
    pub codec: String,
    pub outcomes: Vec<EncodeOutcome>,
}

/// Outcome counts for a sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Printed in a dry run, never started
    pub not_run: usize,
    /// Left out after a failure in fail-fast mode
    pub skipped: usize,
}

impl SweepReport {
    pub fn summary(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();
        for outcome in &self.outcomes {
            match outcome.status {
                EncodeStatus::Succeeded => summary.succeeded += 1,
                EncodeStatus::NotRun => summary.not_run += 1,
                EncodeStatus::Skipped => summary.skipped += 1,
                _ => summary.failed += 1,
            }
        }
        summary
    }

    /// True when every QP was encoded successfully
    pub fn all_succeeded(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.status.is_success())
    }

    /// Process exit status for the run.
    ///
    /// Encoder failures only change the status in strict mode; otherwise the
    /// run exits 0 whatever the encodes did.
    pub fn exit_status(&self, strict: bool) -> u8 {
        if strict && self.summary().failed > 0 {
            1
        } else {
            0
        }
    }

    /// One line per QP with the output size, for the end-of-run listing
    pub fn size_table(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .map(|o| {
                let size = match (&o.status, o.output_bytes) {
                    (EncodeStatus::Succeeded, Some(bytes)) => format_size(bytes, DECIMAL),
                    (EncodeStatus::Succeeded, None) => "no output".to_string(),
                    (EncodeStatus::Failed { exit_code: Some(code) }, _) => format!("failed (exit {})", code),
                    (EncodeStatus::Failed { exit_code: None }, _) => "failed (signal)".to_string(),
                    (EncodeStatus::SpawnFailed { .. }, _) => "failed to start".to_string(),
                    (EncodeStatus::TimedOut { after_secs }, _) => format!("timed out after {}s", after_secs),
                    (EncodeStatus::NotRun, _) => "not run".to_string(),
                    (EncodeStatus::Skipped, _) => "skipped".to_string(),
                };
                format!("qp={} {} {}", o.qp, o.output.display(), size)
            })
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize sweep report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse report: {}", path.display()))
    }
}
