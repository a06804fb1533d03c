pub mod config;
pub mod error;
pub mod qp;
pub mod command;
pub mod runner;
pub mod ffmpeg;
pub mod report;
pub mod sweep;

pub use config::SweepConfig;
pub use error::SweepError;
pub use qp::{Qp, DEFAULT_QP_VALUES};
pub use command::{CommandBuilder, EncodeCommand};
pub use runner::{EncodeOutcome, EncodeStatus};
pub use report::{SweepReport, SweepSummary};
pub use sweep::run_sweep;
