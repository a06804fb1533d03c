use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use crate::command::EncodeCommand;
use crate::qp::Qp;

/// How a single encode ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EncodeStatus {
    Succeeded,
    Failed { exit_code: Option<i32> },
    SpawnFailed { reason: String },
    TimedOut { after_secs: u64 },
    /// Dry run: printed but never started
    NotRun,
    /// Not attempted because an earlier encode failed in fail-fast mode
    Skipped,
}

impl EncodeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, EncodeStatus::Succeeded)
    }

    /// Whether the encoder was asked to run and did not succeed
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EncodeStatus::Failed { .. } | EncodeStatus::SpawnFailed { .. } | EncodeStatus::TimedOut { .. }
        )
    }
}

/// Record of one QP iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOutcome {
    pub qp: Qp,
    pub command: String,
    pub output: PathBuf,
    #[serde(flatten)]
    pub status: EncodeStatus,
    pub output_bytes: Option<u64>,
    pub elapsed_ms: u64,
}

impl EncodeOutcome {
    /// Outcome for a command that was never started
    pub fn not_started(cmd: &EncodeCommand, status: EncodeStatus) -> Self {
        EncodeOutcome {
            qp: cmd.qp,
            command: cmd.display(),
            output: cmd.output.clone(),
            status,
            output_bytes: None,
            elapsed_ms: 0,
        }
    }
}

/// Run one encode to completion.
///
/// ffmpeg inherits the terminal so its progress output and any overwrite
/// prompt reach the user. Errors never escape: a binary that cannot be
/// spawned, a non-zero exit or a timeout all come back as an [`EncodeStatus`].
pub async fn run_encode(cmd: &EncodeCommand, timeout_secs: Option<u64>) -> EncodeOutcome {
    debug!("Executing: {}", cmd.display());
    let started = Instant::now();

    let mut child = match Command::new(&cmd.program)
        .args(&cmd.args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to spawn {}: {}", cmd.program.display(), e);
            return finish(cmd, EncodeStatus::SpawnFailed { reason: e.to_string() }, started);
        }
    };

    let waited = match timeout_secs {
        Some(secs) => match timeout(Duration::from_secs(secs), child.wait()).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Encode for qp={} exceeded {}s, killing ffmpeg", cmd.qp, secs);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill stuck encoder process: {}", e);
                }
                return finish(cmd, EncodeStatus::TimedOut { after_secs: secs }, started);
            }
        },
        None => child.wait().await,
    };

    let status = match waited {
        Ok(exit) if exit.success() => EncodeStatus::Succeeded,
        Ok(exit) => EncodeStatus::Failed { exit_code: exit.code() },
        Err(e) => EncodeStatus::SpawnFailed {
            reason: format!("failed to wait for encoder process: {}", e),
        },
    };

    finish(cmd, status, started)
}

fn finish(cmd: &EncodeCommand, status: EncodeStatus, started: Instant) -> EncodeOutcome {
    // A file left by an earlier run is not this encode's output
    let output_bytes = if status.is_success() {
        std::fs::metadata(&cmd.output).ok().map(|m| m.len())
    } else {
        None
    };
    EncodeOutcome {
        qp: cmd.qp,
        command: cmd.display(),
        output: cmd.output.clone(),
        status,
        output_bytes,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }
}
