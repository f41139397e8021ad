use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use trailstamp::file_ops::{find_video_files, FileProcessor, ProcessResult};
use trailstamp::ocr;

#[derive(Parser)]
#[command(name = "trailstamp")]
#[command(version)]
#[command(about = "Trail camera video timestamp fixer")]
#[command(long_about = "Corrects file creation/modification timestamps on trail camera videos \
from the date/time overlay burned into the first frame. Copying footage off a camera card \
overwrites the filesystem timestamps with the copy time, so the overlay is read back with OCR, \
adjusted for a daylight-saving transition spanned by the deployment window, and written onto \
the file's attributes.

Supported file types: AVI, MP4, MOV (top level of the folder only)")]
struct Cli {
    /// Directory containing the trail camera video files
    video_folder: PathBuf,

    /// Date the cameras were placed in the field (YYYY-MM-DD)
    #[arg(long)]
    placed: NaiveDate,

    /// Date the cameras were checked or retrieved (YYYY-MM-DD)
    #[arg(long)]
    checked: NaiveDate,

    /// Path to the ffmpeg executable
    #[arg(long)]
    ffmpeg: PathBuf,

    /// Path to the tesseract executable
    #[arg(long, default_value_os_t = ocr::default_tesseract_path())]
    tesseract: PathBuf,

    /// Increase verbosity (-v=INFO, -vv=DEBUG, -vvv=TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose)?;

    info!("Starting trailstamp");

    if cli.checked < cli.placed {
        anyhow::bail!(
            "--checked ({}) must not precede --placed ({})",
            cli.checked,
            cli.placed
        );
    }
    if !cli.video_folder.is_dir() {
        anyhow::bail!("Video folder not found: {}", cli.video_folder.display());
    }

    let processor = FileProcessor::new(cli.ffmpeg, cli.tesseract, cli.placed, cli.checked)?;
    processor.verify_tools()?;

    let files = find_video_files(&cli.video_folder)?;
    if files.is_empty() {
        anyhow::bail!("No video files found in {}", cli.video_folder.display());
    }
    info!("Found {} video files", files.len());

    let results = processor.process_files(&files);

    print_summary(&results);
    Ok(())
}

fn setup_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    Ok(())
}

fn print_summary(results: &[ProcessResult]) {
    let processed = results.len();
    let corrected = results.iter().filter(|r| r.success && r.corrected).count();
    let skipped = results.iter().filter(|r| r.success && !r.corrected).count();
    let errors = results.iter().filter(|r| !r.success).count();

    println!("\nProcessing complete!");
    println!("Files processed: {}", processed);
    println!("Timestamps corrected: {}", corrected);
    println!("Files skipped: {}", skipped);
    println!("Errors: {}", errors);

    if skipped > 0 {
        println!("\nSkipped:");
        for result in results.iter().filter(|r| r.success && !r.corrected) {
            println!(
                "  {}: {}",
                result.file_path.display(),
                result.error.as_deref().unwrap_or("Unknown reason")
            );
        }
    }

    if errors > 0 {
        println!("\nErrors:");
        for result in results.iter().filter(|r| !r.success) {
            println!(
                "  {}: {}",
                result.file_path.display(),
                result.error.as_deref().unwrap_or("Unknown error")
            );
        }
    }
}
