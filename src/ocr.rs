/**
 * OCR invocation and timestamp token recovery
 *
 * Runs tesseract over the cropped timestamp band and scans the recognized
 * text for a date-shaped and a time-shaped token. Trail-cam crops are low
 * resolution, so the crop's horizontal resolution is passed as the DPI
 * hint; --psm 11 (sparse text) tolerates the noise around the overlay.
 */

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Page segmentation mode passed to tesseract: sparse text.
const SEGMENTATION_MODE: &str = "11";

/// Default tesseract location: the conventional install path on Windows,
/// PATH lookup elsewhere.
pub fn default_tesseract_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Program Files\Tesseract-OCR\tesseract.exe")
    } else {
        PathBuf::from("tesseract")
    }
}

pub struct OcrReader {
    tesseract: PathBuf,
}

impl OcrReader {
    pub fn new(tesseract: PathBuf) -> Self {
        Self { tesseract }
    }

    /// Check that the tesseract executable is present and runnable.
    pub fn verify_available(&self) -> Result<()> {
        let output = Command::new(&self.tesseract)
            .arg("--version")
            .output()
            .with_context(|| format!("Failed to run {}", self.tesseract.display()))?;
        if !output.status.success() {
            anyhow::bail!("{} exited with {}", self.tesseract.display(), output.status);
        }
        Ok(())
    }

    /// Run tesseract on an image and return the recognized text.
    ///
    /// The image's horizontal resolution goes in as the DPI hint; output is
    /// requested directly on stdout rather than through a result file.
    pub fn read_text(&self, image_path: &Path, dpi: u32) -> Result<String> {
        let output = Command::new(&self.tesseract)
            .arg(image_path)
            .arg("stdout")
            .args(["--dpi", &dpi.to_string()])
            .args(["--psm", SEGMENTATION_MODE])
            .output()
            .with_context(|| format!("Failed to run {}", self.tesseract.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        debug!("OCR output: {:?}", text);
        Ok(text)
    }
}

/// Matches whitespace-separated OCR tokens against the overlay's date and
/// time shapes.
pub struct TimestampMatcher {
    date_re: Regex,
    time_re: Regex,
}

impl TimestampMatcher {
    pub fn new() -> Self {
        Self {
            date_re: Regex::new(r"^\d{4}/\d{2}/\d{2}$").expect("valid date pattern"),
            time_re: Regex::new(r"^\d{2}:\d{2}:\d{2}$").expect("valid time pattern"),
        }
    }

    /// Scan all tokens for date and time candidates. Later matches
    /// overwrite earlier ones; both must be present for a result.
    pub fn scan(&self, text: &str) -> Option<(String, String)> {
        let mut date = None;
        let mut time = None;
        for token in text.split_whitespace() {
            if self.date_re.is_match(token) {
                date = Some(token.to_string());
            } else if self.time_re.is_match(token) {
                time = Some(token.to_string());
            }
        }
        match (date, time) {
            (Some(date), Some(time)) => Some((date, time)),
            _ => None,
        }
    }
}

impl Default for TimestampMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the candidate pair into a naive camera timestamp. Fails on
/// impossible calendar dates or clock times (OCR misreads).
pub fn parse_candidates(date: &str, time: &str) -> Result<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y/%m/%d")
        .with_context(|| format!("Invalid date {:?}", date))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .with_context(|| format!("Invalid time {:?}", time))?;
    Ok(date.and_time(time))
}
