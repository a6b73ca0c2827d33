//! Configuration types for phototidy

use crate::media::MediaKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for a classification run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory to classify. Year-month folders are created directly under it.
    pub root_dir: PathBuf,

    /// Verbose console output
    pub verbose: bool,

    /// Write a per-run log file into the root directory
    pub log_file: bool,

    /// Write the log file as JSON lines
    pub json_log: bool,

    /// Image extensions the classifier picks up
    pub image_extensions: Vec<String>,

    /// Video extensions the classifier picks up
    pub video_extensions: Vec<String>,

    /// Extensions treated as video when choosing a time source. Wider than
    /// `video_extensions`; it does not decide which files are visited.
    pub video_detect_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            verbose: false,
            log_file: true,
            json_log: false,
            image_extensions: vec![
                "jpg".into(), "jpeg".into(), "png".into(),
                "tiff".into(), "tif".into(), "heic".into(),
            ],
            video_extensions: vec!["mp4".into(), "mov".into(), "avi".into()],
            video_detect_extensions: vec![
                "mp4".into(), "mov".into(), "avi".into(),
                "mkv".into(), "flv".into(), "wmv".into(),
            ],
        }
    }
}

impl Config {
    /// Create a default configuration rooted at `root_dir`
    pub fn for_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Check if a file extension is a supported image format
    pub fn is_image(&self, ext: &str) -> bool {
        let ext_lower = normalize_ext(ext);
        self.image_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Check if a file extension is a supported video format
    pub fn is_video(&self, ext: &str) -> bool {
        let ext_lower = normalize_ext(ext);
        self.video_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Check if a file extension is on the processing allow-list
    pub fn is_supported(&self, ext: &str) -> bool {
        self.is_image(ext) || self.is_video(ext)
    }

    /// Media kind used to pick the time source and the name prefix
    pub fn media_kind(&self, ext: &str) -> MediaKind {
        let ext_lower = normalize_ext(ext);
        if self.video_detect_extensions.iter().any(|e| e == &ext_lower) {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# phototidy configuration file (TOML)

# Directory to classify
root_dir = "D:/Photos"

# Write a timestamped .log file into root_dir for every run
log_file = true

# Log file as JSON lines instead of plain text
json_log = false

verbose = false

# Files picked up by the classifier
image_extensions = ["jpg", "jpeg", "png", "tiff", "tif", "heic"]
video_extensions = ["mp4", "mov", "avi"]

# Extensions read as video containers when looking for a capture time
video_detect_extensions = ["mp4", "mov", "avi", "mkv", "flv", "wmv"]
"#
        .to_string()
    }
}

fn normalize_ext(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

/// Errors that can occur when loading configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}
