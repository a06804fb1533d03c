use std::path::{Path, PathBuf};
use crate::config::SweepConfig;
use crate::qp::Qp;

/// One fully built ffmpeg invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub output: PathBuf,
    pub qp: Qp,
}

impl EncodeCommand {
    /// Render the invocation as a single printable line.
    ///
    /// Arguments that contain whitespace or quotes are wrapped in double quotes
    /// so the line can be pasted back into a shell.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(quote_arg(&self.program.to_string_lossy()));
        parts.extend(self.args.iter().map(|a| quote_arg(a)));
        parts.join(" ")
    }
}

fn quote_arg(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'');
    if !needs_quotes {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Output file name for a QP, e.g. `output_qp24.265`
pub fn output_file_name(prefix: &str, qp: Qp, ext: &str) -> String {
    format!("{}{}.{}", prefix, qp, ext)
}

/// Builds ffmpeg argument vectors for a sweep
pub struct CommandBuilder<'a> {
    cfg: &'a SweepConfig,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(cfg: &'a SweepConfig) -> Self {
        CommandBuilder { cfg }
    }

    pub fn output_path(&self, qp: Qp) -> PathBuf {
        let name = output_file_name(&self.cfg.output_prefix, qp, &self.cfg.output_ext);
        if self.cfg.output_dir == Path::new(".") {
            PathBuf::from(name)
        } else {
            self.cfg.output_dir.join(name)
        }
    }

    /// Build the encode command for one QP
    ///
    /// Equivalent to
    /// `ffmpeg [-y] -i <input> -c:v <codec> -x265-params qp=<QP> [extra...] <output>`
    pub fn build(&self, qp: Qp) -> EncodeCommand {
        let output = self.output_path(qp);
        let mut args = Vec::new();

        if self.cfg.overwrite {
            args.push("-y".to_string());
        }

        args.push("-i".to_string());
        args.push(self.cfg.input.to_string_lossy().to_string());

        args.push("-c:v".to_string());
        args.push(self.cfg.codec.clone());

        args.push("-x265-params".to_string());
        args.push(format!("qp={}", qp));

        args.extend(self.cfg.extra_args.iter().cloned());

        args.push(output.to_string_lossy().to_string());

        EncodeCommand {
            program: self.cfg.ffmpeg_bin.clone(),
            args,
            output,
            qp,
        }
    }
}
