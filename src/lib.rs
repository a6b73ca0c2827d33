//! phototidy - sort photos and videos into year-month folders
//!
//! This library provides functionality for classifying media files by
//! capture time with support for:
//! - EXIF capture dates for images
//! - MP4/QuickTime container creation times for videos
//! - File system modification time as the last resort
//! - Canonical `IMG_`/`VID_` names with collision renumbering

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod i18n;
pub mod media;
pub mod naming;
pub mod time;

pub use classify::{ClassifyReport, Classifier, FileOutcome, FileStatus, SkipReason};
pub use cli::Cli;
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use media::{MediaFile, MediaKind};
pub use naming::{Allocation, AllocationKind, NameAllocator};
pub use time::{MetadataSource, Provenance, ResolvedTime, TimeResolver};
