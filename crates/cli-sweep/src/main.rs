use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;
use sweep::{qp, run_sweep, SweepConfig};

/// Encode one video with libx265 at several fixed QP values
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input video [default: input.avi]
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Comma-separated QP values, encoded in the given order [default: 24,32,40]
    #[arg(long, value_name = "QP,QP,...")]
    qp: Option<String>,

    /// ffmpeg binary [default: ffmpeg from PATH]
    #[arg(long, value_name = "PATH")]
    ffmpeg: Option<PathBuf>,

    /// Video encoder [default: libx265]
    #[arg(long)]
    codec: Option<String>,

    /// Directory for encoded outputs [default: current directory]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output file name prefix [default: output_qp]
    #[arg(long)]
    prefix: Option<String>,

    /// Output file extension [default: 265]
    #[arg(long)]
    ext: Option<String>,

    /// Overwrite existing outputs without asking
    #[arg(long)]
    overwrite: bool,

    /// Kill an encode after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Stop after the first failed encode
    #[arg(long)]
    fail_fast: bool,

    /// Exit with status 1 if any encode fails
    #[arg(long)]
    strict: bool,

    /// Print the commands without running them
    #[arg(long)]
    dry_run: bool,

    /// Verify ffmpeg, the encoder and the input before encoding
    #[arg(long)]
    preflight: bool,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Extra arguments passed to ffmpeg before the output file
    #[arg(last = true)]
    extra: Vec<String>,
}

impl Args {
    /// Layer command-line flags over the file configuration
    fn apply(self, mut cfg: SweepConfig) -> Result<SweepConfig> {
        if let Some(input) = self.input {
            cfg.input = input;
        }
        if let Some(list) = self.qp {
            cfg.qp_values = qp::parse_qp_list(&list)
                .with_context(|| format!("Invalid --qp value: {}", list))?;
        }
        if let Some(ffmpeg) = self.ffmpeg {
            cfg.ffmpeg_bin = ffmpeg;
        }
        if let Some(codec) = self.codec {
            cfg.codec = codec;
        }
        if let Some(dir) = self.output_dir {
            cfg.output_dir = dir;
        }
        if let Some(prefix) = self.prefix {
            cfg.output_prefix = prefix;
        }
        if let Some(ext) = self.ext {
            cfg.output_ext = ext;
        }
        if self.timeout.is_some() {
            cfg.timeout_secs = self.timeout;
        }
        if self.report.is_some() {
            cfg.report_path = self.report;
        }
        if !self.extra.is_empty() {
            cfg.extra_args = self.extra;
        }
        cfg.overwrite |= self.overwrite;
        cfg.fail_fast |= self.fail_fast;
        cfg.strict |= self.strict;
        cfg.dry_run |= self.dry_run;
        cfg.preflight |= self.preflight;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise info, or debug with --verbose
    let default_level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    let file_cfg = SweepConfig::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    let cfg = args.apply(file_cfg)?;

    info!("QP sweep starting");
    info!("  Input: {}", cfg.input.display());
    info!("  Encoder: {} via {}", cfg.codec, cfg.ffmpeg_bin.display());
    info!("  QP values: {:?}", cfg.qp_values);
    info!("  Output dir: {}", cfg.output_dir.display());

    let report = run_sweep(&cfg).await?;

    for line in report.size_table() {
        info!("  {}", line);
    }

    let summary = report.summary();
    let status = report.exit_status(cfg.strict);
    if summary.failed > 0 {
        if status != 0 {
            error!("{} of {} encodes failed", summary.failed, report.outcomes.len());
        } else {
            warn!(
                "{} of {} encodes failed; exiting 0 (use --strict to fail the run)",
                summary.failed,
                report.outcomes.len()
            );
        }
    }

    Ok(ExitCode::from(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_no_flags_keeps_defaults() {
        let args = Args::parse_from(["qpsweep"]);
        let cfg = args.apply(SweepConfig::default()).unwrap();
        assert_eq!(cfg, SweepConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "qpsweep",
            "-i",
            "clip.mkv",
            "--qp",
            "20, 30",
            "--overwrite",
            "--strict",
            "--timeout",
            "900",
            "--",
            "-preset",
            "slow",
        ]);
        let cfg = args.apply(SweepConfig::default()).unwrap();
        assert_eq!(cfg.input, PathBuf::from("clip.mkv"));
        assert_eq!(cfg.qp_values, vec![20, 30]);
        assert!(cfg.overwrite);
        assert!(cfg.strict);
        assert_eq!(cfg.timeout_secs, Some(900));
        assert_eq!(cfg.extra_args, vec!["-preset", "slow"]);
    }

    #[test]
    fn test_bad_qp_flag() {
        let args = Args::parse_from(["qpsweep", "--qp", "24,high"]);
        assert!(args.apply(SweepConfig::default()).is_err());
    }

    #[test]
    fn test_flags_do_not_clear_file_settings() {
        let file_cfg = SweepConfig { fail_fast: true, timeout_secs: Some(60), ..Default::default() };
        let args = Args::parse_from(["qpsweep"]);
        let cfg = args.apply(file_cfg).unwrap();
        assert!(cfg.fail_fast);
        assert_eq!(cfg.timeout_secs, Some(60));
    }
}
