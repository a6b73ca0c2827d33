//! Media file descriptors

use crate::config::Config;
use std::path::{Path, PathBuf};

/// Broad category of a media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Prefix used by canonical file names
    pub fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "IMG",
            MediaKind::Video => "VID",
        }
    }
}

/// A file discovered during one classification pass
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Full path of the file
    pub path: PathBuf,
    /// Lower-cased extension including the leading dot, e.g. `.jpg`
    pub extension: String,
    /// Image or video
    pub kind: MediaKind,
    /// Current file name
    pub name: String,
}

impl MediaFile {
    /// Build a descriptor if the file is on the processing allow-list
    pub fn from_path(path: &Path, config: &Config) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        if !config.is_supported(ext) {
            return None;
        }
        let name = path.file_name().and_then(|n| n.to_str())?.to_string();

        Some(Self {
            path: path.to_path_buf(),
            extension: format!(".{}", ext.to_lowercase()),
            kind: config.media_kind(ext),
            name,
        })
    }
}
