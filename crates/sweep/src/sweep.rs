use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;
use crate::command::CommandBuilder;
use crate::config::SweepConfig;
use crate::ffmpeg;
use crate::report::SweepReport;
use crate::runner::{self, EncodeOutcome, EncodeStatus};

/// Run the whole sweep, one encode at a time, in configured QP order.
///
/// Each command line is printed to stdout before it runs. A failed encode is
/// logged and the loop moves on to the next QP unless `fail_fast` is set.
/// Errors are returned only for invalid configuration or a failed preflight;
/// encoder failures are reported through the outcomes.
pub async fn run_sweep(cfg: &SweepConfig) -> Result<SweepReport> {
    let qps = cfg.validate()?;

    if cfg.preflight {
        let probe = ffmpeg::preflight(cfg).await?;
        info!(
            "Preflight ok: ffmpeg {} with encoder {}",
            probe.version_label(), cfg.codec
        );
    }

    if !cfg.output_dir.as_os_str().is_empty() && !cfg.dry_run {
        std::fs::create_dir_all(&cfg.output_dir)
            .with_context(|| format!("Failed to create output directory: {}", cfg.output_dir.display()))?;
    }

    let mut report = SweepReport {
        run_id: Uuid::new_v4(),
        started_at: Utc::now(),
        finished_at: None,
        input: cfg.input.clone(),
        codec: cfg.codec.clone(),
        outcomes: Vec::with_capacity(qps.len()),
    };

    info!(
        "Sweep {} starting: {} QP values over {}",
        report.run_id,
        qps.len(),
        cfg.input.display()
    );

    let builder = CommandBuilder::new(cfg);
    let mut stopped = false;

    for qp in qps {
        let cmd = builder.build(qp);

        if stopped {
            report.outcomes.push(EncodeOutcome::not_started(&cmd, EncodeStatus::Skipped));
            continue;
        }

        println!("{}", cmd.display());

        if cfg.dry_run {
            report.outcomes.push(EncodeOutcome::not_started(&cmd, EncodeStatus::NotRun));
            continue;
        }

        let outcome = runner::run_encode(&cmd, cfg.timeout_secs).await;
        match &outcome.status {
            EncodeStatus::Succeeded => info!(
                "qp={} finished in {:.1}s -> {}",
                qp,
                outcome.elapsed_ms as f64 / 1000.0,
                outcome.output.display()
            ),
            other => {
                warn!("qp={} did not succeed: {:?}", qp, other);
                if cfg.fail_fast {
                    warn!("Fail-fast enabled, skipping remaining QP values");
                    stopped = true;
                }
            }
        }
        report.outcomes.push(outcome);
    }

    report.finished_at = Some(Utc::now());

    let summary = report.summary();
    info!(
        "Sweep {} done: {} succeeded, {} failed, {} not run, {} skipped",
        report.run_id, summary.succeeded, summary.failed, summary.not_run, summary.skipped
    );

    if let Some(path) = &cfg.report_path {
        report.save(path)?;
        info!("Report written to {}", path.display());
    }

    Ok(report)
}
