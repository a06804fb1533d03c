use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SweepError {
    #[error("QP {0} is outside the x265 range 0..=51")]
    QpOutOfRange(u32),

    #[error("QP {0} appears more than once in the sweep")]
    DuplicateQp(u8),

    #[error("QP list is empty")]
    EmptyQpList,

    #[error("Invalid QP value: {0:?}")]
    InvalidQp(String),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Input file does not exist: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("Encoder not available in ffmpeg build: {0}")]
    EncoderUnavailable(String),

    #[error("Could not determine ffmpeg version: {0}")]
    FfmpegVersion(String),
}
