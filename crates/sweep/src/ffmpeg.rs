use std::fmt;
use std::path::Path;
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use tokio::process::Command;
use crate::config::SweepConfig;
use crate::error::SweepError;

/// FFmpeg version information
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FfmpegVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for FfmpegVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FfmpegVersion {
    /// Parse the first line of `ffmpeg -version`.
    ///
    /// Accepts `ffmpeg version 6.1.1`, `ffmpeg version n6.1` and suffixed
    /// builds such as `ffmpeg version 7.0-static`. Git snapshot builds
    /// (`N-112345-g...`) carry no release number and are rejected.
    pub fn parse(version_str: &str) -> Result<Self, SweepError> {
        let token = version_str
            .split_whitespace()
            .skip_while(|s| *s != "version")
            .nth(1)
            .or_else(|| {
                version_str
                    .split_whitespace()
                    .find(|s| s.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false))
            })
            .ok_or_else(|| SweepError::FfmpegVersion(version_str.to_string()))?;

        let token = token.strip_prefix('n').unwrap_or(token);
        let numeric: String = token
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        let mut parts = numeric.split('.').filter(|p| !p.is_empty());
        let major = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(|| SweepError::FfmpegVersion(version_str.to_string()))?;
        let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);

        Ok(FfmpegVersion { major, minor, patch })
    }
}

/// What the preflight learned about the ffmpeg binary
#[derive(Debug, Clone)]
pub struct FfmpegInfo {
    pub version_line: String,
    pub version: Option<FfmpegVersion>,
}

impl FfmpegInfo {
    pub fn version_label(&self) -> String {
        match &self.version {
            Some(v) => v.to_string(),
            None => self.version_line.clone(),
        }
    }
}

/// Run `ffmpeg -version` and return its first line
async fn detect_version(ffmpeg_bin: &Path) -> Result<String> {
    let output = Command::new(ffmpeg_bin)
        .arg("-version")
        .output()
        .await
        .with_context(|| format!("Failed to execute FFmpeg at: {}", ffmpeg_bin.display()))?;

    if !output.status.success() {
        return Err(anyhow!(
            "FFmpeg version check failed (exit code {})",
            output.status.code().unwrap_or(-1)
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .ok_or_else(|| anyhow!("Empty output from FFmpeg -version"))
}

/// Whether `ffmpeg -encoders` output lists the named encoder.
///
/// Encoder lines look like ` V....D libx265              libx265 H.265 / HEVC`;
/// the name is the second column.
pub fn encoders_list_contains(encoders_output: &str, codec: &str) -> bool {
    encoders_output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|name| name == codec)
}

async fn has_encoder(ffmpeg_bin: &Path, codec: &str) -> Result<bool> {
    let output = Command::new(ffmpeg_bin)
        .arg("-hide_banner")
        .arg("-encoders")
        .output()
        .await
        .with_context(|| format!("Failed to query FFmpeg encoders at: {}", ffmpeg_bin.display()))?;

    if !output.status.success() {
        return Err(anyhow!("FFmpeg encoder query failed"));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(encoders_list_contains(&stdout, codec))
}

/// Probe the ffmpeg binary and confirm it can run the configured encoder
pub async fn probe(ffmpeg_bin: &Path, codec: &str) -> Result<FfmpegInfo> {
    let version_line = detect_version(ffmpeg_bin).await?;
    debug!("FFmpeg reports: {}", version_line);

    let version = match FfmpegVersion::parse(&version_line) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    if !has_encoder(ffmpeg_bin, codec).await? {
        return Err(SweepError::EncoderUnavailable(codec.to_string()).into());
    }

    Ok(FfmpegInfo { version_line, version })
}

/// Checks run before the first encode when preflight is enabled
pub async fn preflight(cfg: &SweepConfig) -> Result<FfmpegInfo> {
    if !cfg.input.exists() {
        return Err(SweepError::InputMissing(cfg.input.clone()).into());
    }

    let info = probe(&cfg.ffmpeg_bin, &cfg.codec).await?;
    info!("Using ffmpeg {} at {}", info.version_label(), cfg.ffmpeg_bin.display());
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn test_version_parsing() {
        let v = FfmpegVersion::parse("ffmpeg version 6.1.1 Copyright (c) 2000-2023").unwrap();
        assert_eq!(v, FfmpegVersion { major: 6, minor: 1, patch: 1 });

        let v = FfmpegVersion::parse("ffmpeg version n7.0").unwrap();
        assert_eq!(v, FfmpegVersion { major: 7, minor: 0, patch: 0 });

        let v = FfmpegVersion::parse("ffmpeg version 5.1.4-0+deb12u1 Copyright").unwrap();
        assert_eq!(v, FfmpegVersion { major: 5, minor: 1, patch: 4 });

        let v = FfmpegVersion::parse("ffmpeg version 8").unwrap();
        assert_eq!(v, FfmpegVersion { major: 8, minor: 0, patch: 0 });
    }

    #[test]
    fn test_version_parsing_rejects_snapshots() {
        assert!(FfmpegVersion::parse("ffmpeg version N-112345-gabcdef0").is_err());
        assert!(FfmpegVersion::parse("").is_err());
    }

    #[test]
    fn test_encoders_list_contains() {
        let listing = "Encoders:\n V..... = Video\n ------\n V....D libx264              libx264 H.264\n V....D libx265              libx265 H.265 / HEVC (codec hevc)\n A....D aac                  AAC\n";
        assert!(encoders_list_contains(listing, "libx265"));
        assert!(encoders_list_contains(listing, "aac"));
        assert!(!encoders_list_contains(listing, "libsvtav1"));
        // The description column must not count as an encoder name
        assert!(!encoders_list_contains(listing, "H.265"));
    }

    #[tokio::test]
    async fn test_preflight_missing_input() {
        let cfg = SweepConfig {
            input: PathBuf::from("/nonexistent/input.avi"),
            ..Default::default()
        };
        let err = preflight(&cfg).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SweepError>(),
            Some(&SweepError::InputMissing(PathBuf::from("/nonexistent/input.avi")))
        );
    }

    #[tokio::test]
    async fn test_probe_missing_binary() {
        let result = probe(Path::new("/nonexistent/ffmpeg"), "libx265").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_probe_real_ffmpeg_if_present() {
        // Only meaningful where ffmpeg is installed
        let info = match probe(Path::new("ffmpeg"), "libx265").await {
            Ok(info) => info,
            Err(_) => {
                println!("FFmpeg with libx265 not available, skipping");
                return;
            }
        };
        assert!(info.version_line.starts_with("ffmpeg version"));
    }

    proptest! {
        #[test]
        fn test_version_roundtrip(major in 0u32..100, minor in 0u32..100, patch in 0u32..100) {
            let line = format!("ffmpeg version {}.{}.{} Copyright (c) the FFmpeg developers", major, minor, patch);
            let v = FfmpegVersion::parse(&line).unwrap();
            prop_assert_eq!(v, FfmpegVersion { major, minor, patch });
            prop_assert_eq!(v.to_string(), format!("{}.{}.{}", major, minor, patch));
        }
    }
}
