/**
 * Per-file correction pipeline and filesystem metadata writer
 *
 * Drives each video through extract -> crop -> OCR -> parse -> DST-correct
 * -> write attributes, strictly one file at a time. Scratch artifacts live
 * in a per-run temp directory owned by the processor and are cleared at the
 * start of every iteration.
 */

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use filetime::FileTime;
use image::GenericImageView;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use walkdir::WalkDir;

use crate::crop::crop_timestamp_band;
use crate::dst::corrected_capture_time;
use crate::frame::FrameExtractor;
use crate::ocr::{self, OcrReader, TimestampMatcher};

/// Video container extensions the enumerator accepts.
const VIDEO_EXTENSIONS: [&str; 3] = ["avi", "mp4", "mov"];

/// List video files in the top level of a directory, sorted by name.
///
/// Sorted for deterministic runs; ordering by file timestamp would be
/// self-defeating since the timestamps are exactly what gets corrected.
pub fn find_video_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(directory)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            if let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) {
                if VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Why a file was left with its original timestamps.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("frame extraction failed: {0}")]
    FrameExtraction(String),

    #[error("could not read extracted frame: {0}")]
    UnreadableFrame(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("no date/time tokens in OCR output")]
    NoTimestamp,

    #[error("impossible timestamp (date {date:?}, time {time:?})")]
    InvalidTimestamp { date: String, time: String },
}

/// Outcome of one file's trip through the pipeline.
#[derive(Debug)]
pub enum Correction {
    Applied(NaiveDateTime),
    Skipped(SkipReason),
}

/// Per-file processing record consumed by the run summary.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub file_path: PathBuf,
    pub success: bool,
    pub corrected: bool,
    pub timestamp: Option<NaiveDateTime>,
    pub error: Option<String>,
}

/// Scratch artifacts reused across iterations, owned for the whole run.
///
/// The fixed frame/crop paths are treated as exclusively owned by the
/// current iteration: removed defensively before each file so a failed
/// iteration can never leak stale data into the next one. Dropping the
/// TempDir removes everything, the diagnostic ffmpeg log included.
struct Scratch {
    frame: PathBuf,
    crop: PathBuf,
    ffmpeg_log: PathBuf,
    _dir: TempDir,
}

impl Scratch {
    fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("trailstamp")
            .tempdir()
            .context("Failed to create scratch directory")?;

        Ok(Self {
            frame: dir.path().join("frame.jpg"),
            crop: dir.path().join("crop.png"),
            ffmpeg_log: dir.path().join("ffmpeg.log"),
            _dir: dir,
        })
    }

    /// Remove per-iteration artifacts left by a previous file.
    fn clear(&self) -> Result<()> {
        for path in [&self.frame, &self.crop] {
            if path.exists() {
                fs::remove_file(path)
                    .with_context(|| format!("Failed to remove stale {}", path.display()))?;
            }
        }
        Ok(())
    }
}

pub struct FileProcessor {
    extractor: FrameExtractor,
    reader: OcrReader,
    matcher: TimestampMatcher,
    placed: NaiveDate,
    checked: NaiveDate,
    scratch: Scratch,
}

impl FileProcessor {
    pub fn new(
        ffmpeg: PathBuf,
        tesseract: PathBuf,
        placed: NaiveDate,
        checked: NaiveDate,
    ) -> Result<Self> {
        Ok(Self {
            extractor: FrameExtractor::new(ffmpeg),
            reader: OcrReader::new(tesseract),
            matcher: TimestampMatcher::new(),
            placed,
            checked,
            scratch: Scratch::new()?,
        })
    }

    /// Verify both external tools before touching any file.
    pub fn verify_tools(&self) -> Result<()> {
        self.extractor.verify_available()?;
        self.reader.verify_available()?;
        Ok(())
    }

    /// Process every file sequentially, start to finish, one at a time.
    ///
    /// Per-file failures never abort the run; they are recorded in the
    /// result list and surfaced by the summary.
    pub fn process_files(&self, files: &[PathBuf]) -> Vec<ProcessResult> {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message("Correcting timestamps");

        let mut results = Vec::with_capacity(files.len());
        for (index, file_path) in files.iter().enumerate() {
            info!(
                "Processing file {}/{}: {}",
                index + 1,
                files.len(),
                file_path.display()
            );

            let result = match self.process_single(file_path) {
                Ok(Correction::Applied(timestamp)) => {
                    debug!("Corrected {} to {}", file_path.display(), timestamp);
                    ProcessResult {
                        file_path: file_path.clone(),
                        success: true,
                        corrected: true,
                        timestamp: Some(timestamp),
                        error: None,
                    }
                }
                Ok(Correction::Skipped(reason)) => {
                    warn!("Skipping {}: {}", file_path.display(), reason);
                    ProcessResult {
                        file_path: file_path.clone(),
                        success: true,
                        corrected: false,
                        timestamp: None,
                        error: Some(reason.to_string()),
                    }
                }
                Err(e) => {
                    warn!("Failed to process {}: {:#}", file_path.display(), e);
                    ProcessResult {
                        file_path: file_path.clone(),
                        success: false,
                        corrected: false,
                        timestamp: None,
                        error: Some(format!("{:#}", e)),
                    }
                }
            };

            results.push(result);
            pb.inc(1);
        }

        pb.finish_with_message("Done");
        results
    }

    /// One file through the whole pipeline.
    ///
    /// External tool failures and unusable OCR output come back as
    /// `Correction::Skipped`; only filesystem faults (scratch cleanup, crop
    /// save, attribute write) surface as errors.
    fn process_single(&self, video: &Path) -> Result<Correction> {
        self.scratch.clear()?;

        if let Err(e) =
            self.extractor
                .extract_first_frame(video, &self.scratch.frame, &self.scratch.ffmpeg_log)
        {
            return Ok(Correction::Skipped(SkipReason::FrameExtraction(format!(
                "{:#}",
                e
            ))));
        }

        let band = {
            let frame = match image::open(&self.scratch.frame) {
                Ok(frame) => frame,
                Err(e) => {
                    return Ok(Correction::Skipped(SkipReason::UnreadableFrame(
                        e.to_string(),
                    )))
                }
            };
            crop_timestamp_band(&frame)
        };
        band.save(&self.scratch.crop).with_context(|| {
            format!("Failed to save cropped band {}", self.scratch.crop.display())
        })?;

        let text = match self.reader.read_text(&self.scratch.crop, band.width()) {
            Ok(text) => text,
            Err(e) => return Ok(Correction::Skipped(SkipReason::Ocr(format!("{:#}", e)))),
        };

        let Some((date, time)) = self.matcher.scan(&text) else {
            return Ok(Correction::Skipped(SkipReason::NoTimestamp));
        };

        let capture = match ocr::parse_candidates(&date, &time) {
            Ok(capture) => capture,
            Err(_) => {
                return Ok(Correction::Skipped(SkipReason::InvalidTimestamp {
                    date,
                    time,
                }))
            }
        };

        let corrected = corrected_capture_time(capture, self.placed, self.checked);
        apply_file_times(video, corrected)
            .with_context(|| format!("Failed to update timestamps on {}", video.display()))?;

        Ok(Correction::Applied(corrected))
    }
}

/// Write the corrected timestamp onto the file's attributes: modification
/// and access times everywhere, creation time where the platform can set it
/// (Windows; Unix exposes no birth-time API).
pub fn apply_file_times(path: &Path, timestamp: NaiveDateTime) -> Result<()> {
    let local = Local
        .from_local_datetime(&timestamp)
        .earliest()
        .with_context(|| format!("{} does not exist in the local timezone", timestamp))?;
    let file_time = FileTime::from_system_time(local.into());

    filetime::set_file_times(path, file_time, file_time)
        .with_context(|| format!("Failed to set file times on {}", path.display()))?;

    #[cfg(windows)]
    filetime_creation::set_file_ctime(path, file_time)
        .with_context(|| format!("Failed to set creation time on {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn find_video_files_filters_extensions_and_sorts_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp4", "a.AVI", "notes.txt", "c.mov", "clip.mkv"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        File::create(dir.path().join("nested").join("d.mp4")).unwrap();

        let files = find_video_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.AVI", "b.mp4", "c.mov"]);
    }

    #[test]
    fn find_video_files_on_empty_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_video_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn apply_file_times_round_trips_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        File::create(&path).unwrap();

        let stamp = NaiveDate::from_ymd_opt(2024, 7, 15)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap();
        apply_file_times(&path, stamp).unwrap();

        let metadata = fs::metadata(&path).unwrap();
        let mtime = FileTime::from_last_modification_time(&metadata);
        let expected = FileTime::from_system_time(
            Local.from_local_datetime(&stamp).earliest().unwrap().into(),
        );
        assert_eq!(mtime.unix_seconds(), expected.unix_seconds());
    }

    #[test]
    fn scratch_clear_removes_stale_artifacts() {
        let scratch = Scratch::new().unwrap();
        fs::write(&scratch.frame, b"stale").unwrap();
        fs::write(&scratch.crop, b"stale").unwrap();

        scratch.clear().unwrap();
        assert!(!scratch.frame.exists());
        assert!(!scratch.crop.exists());
    }
}
