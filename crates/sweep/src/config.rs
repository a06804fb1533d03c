use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::error::SweepError;
use crate::qp::{self, Qp, DEFAULT_QP_VALUES};

/// Configuration for a QP sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// ffmpeg binary, resolved through PATH when not absolute
    pub ffmpeg_bin: PathBuf,
    /// Source video handed to ffmpeg with -i
    pub input: PathBuf,
    /// Video encoder passed to -c:v
    pub codec: String,
    /// QP values, encoded in this order
    pub qp_values: Vec<u32>,
    /// Directory receiving the encoded streams
    pub output_dir: PathBuf,
    /// Output file name prefix; the QP and extension are appended
    pub output_prefix: String,
    /// Output file extension without the dot
    pub output_ext: String,
    /// Extra ffmpeg arguments placed before the output path
    pub extra_args: Vec<String>,
    /// Pass -y so ffmpeg overwrites existing outputs without asking
    pub overwrite: bool,
    /// Kill an encode that runs longer than this many seconds
    pub timeout_secs: Option<u64>,
    /// Stop at the first encode that does not succeed
    pub fail_fast: bool,
    /// Report failure through the exit status when any encode fails
    pub strict: bool,
    /// Print commands without running them
    pub dry_run: bool,
    /// Check ffmpeg, the encoder and the input before encoding
    pub preflight: bool,
    /// Where to write the JSON run report
    pub report_path: Option<PathBuf>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl SweepConfig {
    /// Defaults reproduce the classic three-point sweep of input.avi
    pub fn default_config() -> Self {
        Self {
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            input: PathBuf::from("input.avi"),
            codec: "libx265".to_string(),
            qp_values: DEFAULT_QP_VALUES.iter().map(|&v| v as u32).collect(),
            output_dir: PathBuf::from("."),
            output_prefix: "output_qp".to_string(),
            output_ext: "265".to_string(),
            extra_args: Vec::new(),
            overwrite: false,
            timeout_secs: None,
            fail_fast: false,
            strict: false,
            dry_run: false,
            preflight: false,
            report_path: None,
        }
    }

    /// Load configuration from a file, or return defaults if path is None or file doesn't exist
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)
                    .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

                if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    config = toml::from_str(&content)
                        .with_context(|| format!("Failed to parse TOML config: {}", config_path.display()))?;
                } else {
                    config = serde_json::from_str(&content)
                        .with_context(|| format!("Failed to parse JSON config: {}", config_path.display()))?;
                }
            } else {
                log::warn!("Config file not found, using defaults: {}", config_path.display());
            }
        }

        Ok(config)
    }

    /// Validate the configuration and return the QP values in run order
    pub fn validate(&self) -> Result<Vec<Qp>, SweepError> {
        if self.codec.trim().is_empty() {
            return Err(SweepError::InvalidConfig("codec must not be empty".to_string()));
        }
        if self.output_prefix.is_empty() {
            return Err(SweepError::InvalidConfig("output_prefix must not be empty".to_string()));
        }
        if self.output_prefix.contains(['/', '\\']) {
            return Err(SweepError::InvalidConfig(format!(
                "output_prefix must be a bare file name prefix, got {:?}",
                self.output_prefix
            )));
        }
        if self.output_ext.is_empty() || self.output_ext.contains(['/', '\\', '.']) {
            return Err(SweepError::InvalidConfig(format!(
                "output_ext must be a non-empty extension without dots, got {:?}",
                self.output_ext
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(SweepError::InvalidConfig("timeout_secs must be positive".to_string()));
        }

        qp::validate_qp_list(&self.qp_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = SweepConfig::default();
        assert_eq!(cfg.ffmpeg_bin, PathBuf::from("ffmpeg"));
        assert_eq!(cfg.input, PathBuf::from("input.avi"));
        assert_eq!(cfg.codec, "libx265");
        assert_eq!(cfg.qp_values, vec![24, 32, 40]);
        assert_eq!(cfg.output_dir, PathBuf::from("."));
        assert!(!cfg.overwrite);
        assert!(!cfg.fail_fast);
        assert!(!cfg.strict);
        assert!(cfg.timeout_secs.is_none());
        assert_eq!(cfg.validate().unwrap().len(), 3);
    }

    #[test]
    fn test_load_missing_path_uses_defaults() {
        let cfg = SweepConfig::load_config(None).unwrap();
        assert_eq!(cfg, SweepConfig::default());

        let cfg = SweepConfig::load_config(Some(Path::new("/nonexistent/qpsweep.toml"))).unwrap();
        assert_eq!(cfg, SweepConfig::default());
    }

    #[test]
    fn test_load_toml_partial() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "input = \"clip.y4m\"\nqp_values = [18, 28]\ntimeout_secs = 600").unwrap();

        let cfg = SweepConfig::load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.input, PathBuf::from("clip.y4m"));
        assert_eq!(cfg.qp_values, vec![18, 28]);
        assert_eq!(cfg.timeout_secs, Some(600));
        // Unset fields keep their defaults
        assert_eq!(cfg.codec, "libx265");
        assert_eq!(cfg.output_prefix, "output_qp");
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"overwrite": true, "extra_args": ["-preset", "slow"]}}"#).unwrap();

        let cfg = SweepConfig::load_config(Some(file.path())).unwrap();
        assert!(cfg.overwrite);
        assert_eq!(cfg.extra_args, vec!["-preset", "slow"]);
        assert_eq!(cfg.qp_values, vec![24, 32, 40]);
    }

    #[test]
    fn test_load_malformed_fails() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(SweepConfig::load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cfg = SweepConfig { qp_values: vec![24, 60], ..Default::default() };
        assert_eq!(cfg.validate(), Err(SweepError::QpOutOfRange(60)));

        let cfg = SweepConfig { qp_values: vec![], ..Default::default() };
        assert_eq!(cfg.validate(), Err(SweepError::EmptyQpList));

        let cfg = SweepConfig { output_prefix: "../out".to_string(), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(SweepError::InvalidConfig(_))));

        let cfg = SweepConfig { output_ext: ".265".to_string(), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(SweepError::InvalidConfig(_))));

        let cfg = SweepConfig { codec: " ".to_string(), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(SweepError::InvalidConfig(_))));

        let cfg = SweepConfig { timeout_secs: Some(0), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(SweepError::InvalidConfig(_))));
    }
}
