//! CLI argument parsing with clap

use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// phototidy - sort photos and videos into year-month folders
///
/// Reads the capture time of every photo and video from EXIF data, video
/// container metadata or the file modification time, then moves each file
/// into a `YYYY-MM` folder under a canonical `IMG_`/`VID_` name.
#[derive(Parser, Debug)]
#[command(name = "phototidy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify photos and videos into year-month folders by capture date
    Date(DateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DateArgs {
    /// Directory to process
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Print every processed file to the console
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to configuration file (TOML format)
    ///
    /// CLI arguments override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Output log file as JSON
    #[arg(long)]
    pub json_log: bool,

    /// Do not write a log file into the processed directory
    #[arg(long)]
    pub no_log_file: bool,
}

impl Default for DateArgs {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            verbose: false,
            config: None,
            json_log: false,
            no_log_file: false,
        }
    }
}

impl DateArgs {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        // `--dir` always has a value; only a non-default one overrides the file
        if self.dir != PathBuf::from(".") {
            config.root_dir = self.dir.clone();
        }
        if self.verbose {
            config.verbose = true;
        }
        if self.json_log {
            config.json_log = true;
        }
        if self.no_log_file {
            config.log_file = false;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::for_root(self.dir.clone()))
    }
}
