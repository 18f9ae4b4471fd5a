use crate::error::MergerError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;

/// The external media tool, invoked once per merge or frame extraction.
///
/// Exit status and standard error are the whole contract with the tool.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `-i <first> -i <second> -c copy <output>`: stream copy, no re-encode.
    pub fn merge_command(&self, first: &Path, second: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-i")
            .arg(first)
            .arg("-i")
            .arg(second)
            .arg("-c")
            .arg("copy")
            .arg(output);
        cmd
    }

    /// `-y -i <input> -ss <offset> -vframes 1 -q:v <quality> <output>`.
    pub fn frame_command(
        &self,
        input: &Path,
        offset: Duration,
        quality: u8,
        output: &Path,
    ) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-ss")
            .arg(format_timestamp(offset))
            .arg("-vframes")
            .arg("1")
            .arg("-q:v")
            .arg(quality.to_string())
            .arg(output);
        cmd
    }

    /// Runs `cmd` to completion, capturing its output.
    ///
    /// A nonzero exit becomes a `ToolError` carrying the tool's stderr.
    pub fn run(&self, cmd: &mut Command) -> Result<(), MergerError> {
        debug!("running {}", describe(cmd));
        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                MergerError::ToolError(format!(
                    "failed to start '{}': {}",
                    self.program.display(),
                    e
                ))
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(MergerError::ToolError(format!(
            "{}: {}",
            output.status,
            stderr.trim()
        )))
    }

    /// Runs `cmd` with all of its console output discarded.
    pub fn run_quiet(&self, cmd: &mut Command) -> Result<(), MergerError> {
        debug!("running {}", describe(cmd));
        let status = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                MergerError::ToolError(format!(
                    "failed to start '{}': {}",
                    self.program.display(),
                    e
                ))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(MergerError::ToolError(status.to_string()))
        }
    }
}

/// `HH:MM:SS`, with milliseconds appended when the offset has any.
pub fn format_timestamp(offset: Duration) -> String {
    let secs = offset.as_secs();
    let millis = offset.subsec_millis();
    let base = format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
    if millis == 0 {
        base
    } else {
        format!("{}.{:03}", base, millis)
    }
}

/// Renders a command line for logs.
pub fn describe(cmd: &Command) -> String {
    let args: Vec<String> = cmd
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    format!("{} {}", Path::new(cmd.get_program()).display(), args.join(" "))
}
