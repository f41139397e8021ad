/**
 * First-frame extraction via ffmpeg
 *
 * One invocation per video: a select filter keeps only the visually first
 * frame, written to the scratch frame path. ffmpeg's diagnostics go to an
 * append-mode log that is kept for the run and never parsed.
 */

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Filter expression selecting frame number zero.
const FIRST_FRAME_FILTER: &str = "select=eq(n\\,0)";

/// JPEG quality passed to ffmpeg for the dumped frame (2 = near-lossless).
const FRAME_QUALITY: &str = "2";

pub struct FrameExtractor {
    ffmpeg: PathBuf,
}

impl FrameExtractor {
    pub fn new(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }

    /// Check that the ffmpeg executable is present and runnable.
    pub fn verify_available(&self) -> Result<()> {
        let status = Command::new(&self.ffmpeg)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to run {}", self.ffmpeg.display()))?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", self.ffmpeg.display(), status);
        }
        Ok(())
    }

    /// Dump the first frame of `video` to `frame_path`, overwriting any
    /// prior frame. Fails if ffmpeg exits non-zero or writes no frame; the
    /// caller decides whether that skips the file or aborts.
    pub fn extract_first_frame(
        &self,
        video: &Path,
        frame_path: &Path,
        log_path: &Path,
    ) -> Result<()> {
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("Failed to open ffmpeg log {}", log_path.display()))?;
        writeln!(log, "==== {}", video.display())
            .context("Failed to write to ffmpeg log")?;
        let log_err = log.try_clone().context("Failed to clone ffmpeg log handle")?;

        let status = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(video)
            .args(["-vf", FIRST_FRAME_FILTER])
            .args(["-q:v", FRAME_QUALITY])
            .args(["-frames:v", "1"])
            .arg(frame_path)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .status()
            .with_context(|| format!("Failed to run {}", self.ffmpeg.display()))?;

        if !status.success() {
            anyhow::bail!("ffmpeg exited with {} for {}", status, video.display());
        }
        if !frame_path.exists() {
            anyhow::bail!("ffmpeg produced no frame for {}", video.display());
        }
        Ok(())
    }
}
