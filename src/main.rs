//! Vidloader - media URL to video or audio file
//!
//! Command-line front end over the download job orchestrator: one job per
//! invocation, staged in the configured directory and copied out to the
//! destination when done.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn, Level};
use vidloader::delivery::purge_output_dir;
use vidloader::utils::ToolReport;
use vidloader::{AppSettings, Orchestrator, YtDlpEngine};

#[derive(Parser)]
#[command(name = "vidloader", version, about = "Download video or extracted audio from a media URL")]
struct Args {
    /// Staging directory for downloads (overrides VIDLOADER_OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Path to the yt-dlp binary (overrides VIDLOADER_YTDLP_PATH)
    #[arg(long, global = true)]
    ytdlp: Option<PathBuf>,

    /// Path to ffmpeg or its directory (overrides VIDLOADER_FFMPEG_PATH)
    #[arg(long, global = true)]
    ffmpeg_location: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download one URL
    Fetch {
        url: String,

        /// `video` or `audio`
        #[arg(short, long, default_value = "video")]
        format: String,

        /// Where to put the finished file
        #[arg(short, long, default_value = ".")]
        dest: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every file from the staging directory
    Cleanup,
    /// Print the effective configuration
    Config,
    /// Report where yt-dlp and ffmpeg were found
    Doctor,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let mut settings = AppSettings::from_env();
    if let Some(dir) = args.output_dir {
        settings.output_dir = dir;
    }
    if args.ytdlp.is_some() {
        settings.ytdlp_path = args.ytdlp;
    }
    if args.ffmpeg_location.is_some() {
        settings.ffmpeg_location = args.ffmpeg_location;
    }

    match args.command {
        Command::Fetch {
            url,
            format,
            dest,
            json,
        } => fetch(&settings, &url, &format, dest, json).await,
        Command::Cleanup => {
            let removed = purge_output_dir(&settings.output_dir).await?;
            println!("Removed {} file(s) from {}", removed, settings.output_dir.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Doctor => {
            let report = ToolReport::discover(
                settings.ytdlp_path.as_deref(),
                settings.ffmpeg_location.as_deref(),
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            let warnings = report.warnings();
            for warning in &warnings {
                eprintln!("WARNING: {}", warning);
            }
            Ok(if report.ytdlp.is_some() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn fetch(
    settings: &AppSettings,
    url: &str,
    format: &str,
    dest: PathBuf,
    json: bool,
) -> Result<ExitCode> {
    settings
        .ensure_output_dir()
        .await
        .context("Failed to prepare staging directory")?;

    // Check for ffmpeg up front; audio still works without it
    let tools = ToolReport::discover(
        settings.ytdlp_path.as_deref(),
        settings.ffmpeg_location.as_deref(),
    );
    for warning in tools.warnings() {
        warn!("{}", warning);
    }

    let engine = YtDlpEngine::new(tools.ytdlp, settings.ffmpeg_location.clone())?;
    let orchestrator = Orchestrator::from_settings(settings, Arc::new(engine));

    match orchestrator.submit(url, format).await {
        Ok(delivered) => {
            let job_id = delivered.job_id().clone();
            let saved = delivered
                .save_to(&dest)
                .await
                .with_context(|| format!("Failed to save output to {}", dest.display()))?;
            info!("Job {} delivered", job_id);

            if json {
                let body = serde_json::json!({
                    "job_id": job_id,
                    "path": saved,
                });
                println!("{}", body);
            } else {
                println!("Saved {}", saved.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            if json {
                println!("{}", serde_json::to_string(&failure)?);
            } else {
                eprintln!("{}", failure.category.user_message());
                eprintln!("  ({})", failure.message);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
