//! phototidy - sort photos and videos into year-month folders
//!
//! A CLI tool that moves media files into `YYYY-MM` folders named by
//! capture time taken from EXIF, video container metadata or file system
//! timestamps.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use phototidy::cli::{Command, DateArgs};
use phototidy::i18n::Strings;
use phototidy::{Classifier, ClassifyReport, Cli, Config, FileStatus};
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Console styling for the run summary

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(format!("{}\n", "=".repeat(37))));
    }

    pub fn print_title(title: &str) {
        let _ = stdout().execute(Print(style(title).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_stat(key: &str, value: &str, color: Color) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(key).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(style(value).with(color).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print one processed file
    pub fn print_result(status_icon: &str, status_color: Color, source: &str, dest_or_msg: &str) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(status_icon).with(status_color).bold()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(source).italic()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(dest_or_msg).with(CliTheme::HINT)));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Date(args) => run_date(&args),
    };

    if let Err(e) = result {
        cli_output::print_error(&format!("{} {:#}", Strings::processing_failed(), e));
        std::process::exit(1);
    }
}

/// Run the `date` subcommand
fn run_date(args: &DateArgs) -> Result<()> {
    let mut config = load_config(args)?;
    config.root_dir = std::path::absolute(&config.root_dir)
        .with_context(|| format!("cannot resolve {}", config.root_dir.display()))?;

    if !config.root_dir.is_dir() {
        anyhow::bail!("{} is not a readable directory", config.root_dir.display());
    }

    let log_path = config.log_file.then(|| get_log_path(&config.root_dir));
    let _guard = setup_logging(&config, log_path.as_deref())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        root = %config.root_dir.display(),
        "phototidy starting"
    );
    if config.verbose {
        info!(?config, "Configuration loaded");
    }

    cli_output::print_hint(&format!(
        "{} {}",
        Strings::start_processing(),
        config.root_dir.display()
    ));

    let mut classifier = Classifier::new(config);
    let report = match classifier.run() {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Processing failed");
            return Err(e.into());
        }
    };

    print_summary(&report, classifier.config().verbose, log_path.as_deref());
    Ok(())
}

/// Load configuration from file or CLI arguments
fn load_config(args: &DateArgs) -> Result<Config> {
    let config = match &args.config {
        Some(path) => args.merge_with_config(Config::load_from_file(path)?),
        None => args.to_config(),
    };
    Ok(config)
}

/// Log file named after the run's start time, inside the processed directory
fn get_log_path(root: &Path) -> PathBuf {
    root.join(format!("{}.log", Local::now().format("%Y-%m-%d_%H_%M_%S")))
}

/// Setup logging (optional file + console)
///
/// The file receives every per-file line; the console only shows them with
/// `--verbose`.
fn setup_logging(config: &Config, log_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let console_level = if config.verbose { LevelFilter::INFO } else { LevelFilter::WARN };
    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_level);

    let (writer, guard) = match log_path {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            (Some(non_blocking), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter).with(console);

    if config.json_log {
        subscriber
            .with(writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w)))
            .init();
    } else {
        subscriber
            .with(writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .init();
    }

    Ok(guard)
}

fn print_summary(report: &ClassifyReport, verbose: bool, log_path: Option<&Path>) {
    use cli_output::*;

    print_blank();
    print_title(Strings::processing_complete());
    print_stat(Strings::stat_found(), &report.found.to_string(), CliTheme::ACCENT);
    print_stat(Strings::stat_moved(), &report.moved.to_string(), CliTheme::SUCCESS);
    print_stat(Strings::stat_skipped(), &report.skipped.to_string(), CliTheme::WARNING);
    print_stat(
        Strings::stat_already_classified(),
        &report.already_classified.to_string(),
        CliTheme::HINT,
    );
    print_stat(Strings::stat_renumbered(), &report.renumbered.to_string(), CliTheme::ACCENT);

    print_blank();
    print_hint(Strings::time_sources());
    print_stat(Strings::provenance_exif(), &report.provenance.exif.to_string(), CliTheme::ACCENT);
    print_stat(
        Strings::provenance_container(),
        &report.provenance.container.to_string(),
        CliTheme::ACCENT,
    );
    print_stat(
        Strings::provenance_filesystem(),
        &report.provenance.filesystem.to_string(),
        CliTheme::ACCENT,
    );

    if verbose {
        print_separator();
        print_hint(Strings::detailed_results());
        for outcome in &report.outcomes {
            let source = outcome.source.display().to_string();
            match &outcome.status {
                FileStatus::Moved { destination, .. } => {
                    let tag = outcome.time.map(|t| t.provenance.tag()).unwrap_or_default();
                    print_result(
                        "✓",
                        CliTheme::SUCCESS,
                        &source,
                        &format!("→ {} [{}]", destination.display(), tag),
                    );
                }
                FileStatus::Skipped(reason) => {
                    print_result("⊘", CliTheme::WARNING, &source, &reason.to_string());
                }
            }
        }
    }

    let skipped: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| match &o.status {
            FileStatus::Skipped(reason) => Some((&o.source, reason)),
            FileStatus::Moved { .. } => None,
        })
        .collect();
    if !skipped.is_empty() && !verbose {
        print_separator();
        print_hint(Strings::skipped_files());
        for (source, reason) in skipped {
            print_result(
                "⊘",
                CliTheme::ERROR,
                &source.display().to_string(),
                &reason.to_string(),
            );
        }
    }

    print_separator();
    print_hint(&format!(
        "{}: {}",
        Strings::finished_at(),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    if let Some(path) = log_path {
        print_hint(&format!("{} {}", Strings::log_file(), path.display()));
    }
}
