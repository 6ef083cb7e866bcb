use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};

use scorm_native::{
    parse_course, parse_request, resync_scene_durations, synthesize_request, CompletionPolicy,
    ScormVersion,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LevelFilter {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => LevelFilter::Error,
            CliLogLevel::Warn => LevelFilter::Warn,
            CliLogLevel::Info => LevelFilter::Info,
            CliLogLevel::Debug => LevelFilter::Debug,
            CliLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliScormVersion {
    #[value(name = "1.2")]
    V1_2,
    #[value(name = "2004")]
    V2004,
}

impl From<CliScormVersion> for ScormVersion {
    fn from(version: CliScormVersion) -> Self {
        match version {
            CliScormVersion::V1_2 => ScormVersion::V1_2,
            CliScormVersion::V2004 => ScormVersion::V2004,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCompletionStatus {
    Completed,
    PassedFailed,
}

impl From<CliCompletionStatus> for CompletionPolicy {
    fn from(status: CliCompletionStatus) -> Self {
        match status {
            CliCompletionStatus::Completed => CompletionPolicy::Completed,
            CliCompletionStatus::PassedFailed => CompletionPolicy::PassedFailed,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a SCORM package from a synthesis request
    Build {
        /// JSON file holding `{ course, scormVersion, completionStatus }`
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Output archive (defaults to `<identifier>.zip`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overrides the request's SCORM version
        #[arg(long, value_enum)]
        scorm_version: Option<CliScormVersion>,

        /// Overrides the request's completion status policy
        #[arg(long, value_enum)]
        completion_status: Option<CliCompletionStatus>,

        /// Appended to the package identifier instead of the title hash
        #[arg(long, env = "SCORM_TIMESTAMP")]
        timestamp: Option<u64>,
    },

    /// Rescale scene durations of a course to a narration length
    Resync {
        /// Course document JSON
        #[arg(value_name = "COURSE")]
        course: PathBuf,

        /// Narration length in seconds
        #[arg(long)]
        audio_duration: f64,

        /// Output file (defaults to overwriting COURSE)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// SCORM package synthesizer
///
/// Builds SCORM 1.2 / 2004 packages from course documents produced by the
/// editing layer.
#[derive(Parser, Debug)]
#[command(name = "scorm-native")]
#[command(version)]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Set logging level (overrides RUST_LOG)
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

fn init_logging(level: Option<CliLogLevel>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level.into());
    }
    builder.init();
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn build(
    request_path: &Path,
    output: Option<PathBuf>,
    scorm_version: Option<CliScormVersion>,
    completion_status: Option<CliCompletionStatus>,
    timestamp: Option<u64>,
) -> Result<()> {
    let mut request = parse_request(&read_file(request_path)?)
        .with_context(|| format!("Invalid request in {}", request_path.display()))?;
    if let Some(version) = scorm_version {
        request.scorm_version = version.into();
    }
    if let Some(status) = completion_status {
        request.completion_status = status.into();
    }

    let package = synthesize_request(&request, timestamp)?;
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.zip", package.identifier)));
    fs::write(&output, &package.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Wrote {} ({} files, {} bytes)",
        output.display(),
        package.files.len(),
        package.bytes.len()
    );
    Ok(())
}

fn resync(course_path: &Path, audio_duration: f64, output: Option<PathBuf>) -> Result<()> {
    let mut course = parse_course(&read_file(course_path)?)?;
    let Some(video) = course.video.as_mut() else {
        anyhow::bail!("{} has no video to resynchronize", course_path.display());
    };
    resync_scene_durations(video, audio_duration);

    let output = output.unwrap_or_else(|| course_path.to_path_buf());
    let json = serde_json::to_string_pretty(&course)?;
    fs::write(&output, json).with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Resynchronized scenes to {}s -> {}", audio_duration, output.display());
    Ok(())
}

fn main() -> Result<()> {
    let options = CommandLineOptions::parse();
    init_logging(options.log_level);

    match options.command {
        Commands::Build {
            request,
            output,
            scorm_version,
            completion_status,
            timestamp,
        } => build(&request, output, scorm_version, completion_status, timestamp),
        Commands::Resync {
            course,
            audio_duration,
            output,
        } => resync(&course, audio_duration, output),
    }
}
