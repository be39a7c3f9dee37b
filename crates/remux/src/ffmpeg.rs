use std::future::Future;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use log::debug;
use tokio::process::Command;

use crate::outcome::Outcome;
use crate::plan::OutputTarget;
use crate::scan::SourceItem;

/// Reason recorded when ffmpeg fails without writing anything to stderr
pub const UNKNOWN_FFMPEG_ERROR: &str = "unknown ffmpeg error";

/// What a finished remux invocation reported
#[derive(Debug, Clone)]
pub struct RemuxStatus {
    pub exit_code: i32,
    pub stderr: String,
}

/// The remux capability injected into the run loop.
///
/// `Err` means the tool could not be launched or waited on at all; a run
/// that started and failed is reported through `RemuxStatus`.
pub trait Remuxer {
    fn remux(&self, input: &Path, output: &Path) -> impl Future<Output = Result<RemuxStatus>> + Send;
}

/// Real ffmpeg subprocess: container remux with stream copy, overwriting
/// any existing output.
pub struct FfmpegRemuxer {
    ffmpeg_bin: PathBuf,
}

impl FfmpegRemuxer {
    pub fn new() -> Self {
        Self {
            ffmpeg_bin: PathBuf::from("ffmpeg"),
        }
    }

    pub fn with_binary(ffmpeg_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
        }
    }
}

impl Default for FfmpegRemuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, input: &Path, output: &Path) -> Result<RemuxStatus> {
        debug!("ffmpeg command: {} -i {} -c copy -y {}",
               self.ffmpeg_bin.display(), input.display(), output.display());

        let result = Command::new(&self.ffmpeg_bin)
            .arg("-i")
            .arg(input)
            .arg("-c")
            .arg("copy")
            .arg("-y")
            .arg(output)
            .output()
            .await
            .with_context(|| format!("Failed to execute {} for: {}",
                                     self.ffmpeg_bin.display(), input.display()))?;

        let exit_code = result.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&result.stderr).to_string();
        debug!("ffmpeg exit code: {}, stderr length: {}", exit_code, stderr.len());

        Ok(RemuxStatus { exit_code, stderr })
    }
}

/// Convert one pending recording and classify what happened.
///
/// A failed invocation may leave a partial file at the target path; it is
/// not cleaned up here.
pub async fn execute<R: Remuxer>(remuxer: &R, item: &SourceItem, target: &OutputTarget) -> Outcome {
    debug!("Remuxing {} -> {}", item.path.display(), target.path.display());

    match remuxer.remux(&item.path, &target.path).await {
        Ok(status) if status.exit_code == 0 => Outcome::Success,
        Ok(status) => {
            let reason = last_stderr_line(&status.stderr)
                .unwrap_or(UNKNOWN_FFMPEG_ERROR)
                .to_string();
            Outcome::Failed { reason }
        }
        Err(e) => Outcome::Faulted {
            reason: format!("{:#}", e),
        },
    }
}

/// Last non-empty line of ffmpeg's diagnostic output, the one that usually
/// names the actual problem.
pub fn last_stderr_line(stderr: &str) -> Option<&str> {
    stderr.lines().rev().map(str::trim).find(|l| !l.is_empty())
}
