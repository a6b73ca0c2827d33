//! Capture time resolution
//!
//! A file's capture time comes from the first source in a fixed chain that
//! produces one:
//! - container creation time for videos (`mvhd`, then `mdhd`)
//! - EXIF original date for images
//! - file system modification time for everything
//!
//! Only the last step can fail hard.

pub mod container;
pub mod exif;
pub mod filesystem;

use crate::error::{Error, Result};
use crate::media::MediaKind;
use chrono::{NaiveDateTime, Timelike};
use std::fmt;
use std::path::Path;
use tracing::debug;

pub use self::container::ContainerSource;
pub use self::exif::ExifSource;
pub use self::filesystem::ModTimeSource;

/// Which source supplied a resolved timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// EXIF `DateTimeOriginal` (or `DateTime`) of an image
    ExifMetadata,
    /// Movie or media header creation time of a video container
    ContainerMetadata,
    /// File system modification time
    FilesystemModTime,
}

impl Provenance {
    /// Short tag used in log lines
    pub fn tag(&self) -> &'static str {
        match self {
            Provenance::ExifMetadata => "EXIF",
            Provenance::ContainerMetadata => "VIDEO_META",
            Provenance::FilesystemModTime => "FILE_TIME",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A capture time together with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTime {
    pub timestamp: NaiveDateTime,
    pub provenance: Provenance,
}

/// Something that may know when a file was captured
pub trait MetadataSource {
    /// Tag reported when this source wins
    fn provenance(&self) -> Provenance;

    /// Whether the source is consulted for files of this kind
    fn applies_to(&self, kind: MediaKind) -> bool;

    /// Read the capture time. `Error::MetadataUnavailable` means "try the next source".
    fn read_time(&self, path: &Path) -> Result<NaiveDateTime>;
}

/// Priority-ordered chain of metadata sources
pub struct TimeResolver {
    sources: Vec<Box<dyn MetadataSource>>,
}

impl Default for TimeResolver {
    fn default() -> Self {
        Self::with_sources(vec![
            Box::new(ContainerSource),
            Box::new(ExifSource),
            Box::new(ModTimeSource),
        ])
    }
}

impl TimeResolver {
    /// Standard chain: container, EXIF, modification time
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver from an explicit chain, highest priority first
    pub fn with_sources(sources: Vec<Box<dyn MetadataSource>>) -> Self {
        Self { sources }
    }

    /// Resolve the capture time of `path`; the first source that succeeds wins
    pub fn resolve(&self, path: &Path, kind: MediaKind) -> Result<ResolvedTime> {
        let mut last_error: Option<Error> = None;

        for source in self.sources.iter().filter(|s| s.applies_to(kind)) {
            match source.read_time(path) {
                Ok(timestamp) => {
                    let provenance = source.provenance();
                    debug!(?path, %provenance, %timestamp, "Resolved capture time");
                    return Ok(ResolvedTime {
                        timestamp: truncate_to_second(timestamp),
                        provenance,
                    });
                }
                Err(e) => {
                    debug!(
                        ?path,
                        provenance = %source.provenance(),
                        error = %e,
                        "Time source unavailable"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(Error::TimeUnavailable {
            path: path.to_path_buf(),
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no time source applies".to_string()),
        })
    }
}

fn truncate_to_second(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    struct Fixed {
        provenance: Provenance,
        kind: Option<MediaKind>,
        value: Option<NaiveDateTime>,
    }

    impl MetadataSource for Fixed {
        fn provenance(&self) -> Provenance {
            self.provenance
        }

        fn applies_to(&self, kind: MediaKind) -> bool {
            self.kind.is_none_or(|k| k == kind)
        }

        fn read_time(&self, path: &Path) -> Result<NaiveDateTime> {
            self.value
                .ok_or_else(|| Error::metadata_unavailable(path, "fixture has no value"))
        }
    }

    fn fixed(
        provenance: Provenance,
        kind: Option<MediaKind>,
        value: Option<NaiveDateTime>,
    ) -> Box<dyn MetadataSource> {
        Box::new(Fixed {
            provenance,
            kind,
            value,
        })
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 5)
            .unwrap()
            .and_hms_milli_opt(h, m, s, 750)
            .unwrap()
    }

    #[test]
    fn test_first_success_wins() {
        let resolver = TimeResolver::with_sources(vec![
            fixed(Provenance::ContainerMetadata, Some(MediaKind::Video), None),
            fixed(Provenance::ExifMetadata, None, Some(at(10, 0, 0))),
            fixed(Provenance::FilesystemModTime, None, Some(at(12, 0, 0))),
        ]);

        let resolved = resolver
            .resolve(&PathBuf::from("a.mp4"), MediaKind::Video)
            .unwrap();
        assert_eq!(resolved.provenance, Provenance::ExifMetadata);
        assert_eq!(resolved.timestamp, at(10, 0, 0).with_nanosecond(0).unwrap());
    }

    #[test]
    fn test_sources_filtered_by_kind() {
        let resolver = TimeResolver::with_sources(vec![
            fixed(Provenance::ContainerMetadata, Some(MediaKind::Video), Some(at(9, 0, 0))),
            fixed(Provenance::FilesystemModTime, None, Some(at(12, 0, 0))),
        ]);

        let resolved = resolver
            .resolve(&PathBuf::from("a.jpg"), MediaKind::Image)
            .unwrap();
        assert_eq!(resolved.provenance, Provenance::FilesystemModTime);
    }

    #[test]
    fn test_all_sources_fail() {
        let resolver =
            TimeResolver::with_sources(vec![fixed(Provenance::FilesystemModTime, None, None)]);

        let err = resolver
            .resolve(&PathBuf::from("gone.jpg"), MediaKind::Image)
            .unwrap_err();
        assert!(matches!(err, Error::TimeUnavailable { .. }));
    }

    #[test]
    fn test_missing_file_is_time_unavailable() {
        let err = TimeResolver::new()
            .resolve(&PathBuf::from("/no/such/file.jpg"), MediaKind::Image)
            .unwrap_err();
        assert!(matches!(err, Error::TimeUnavailable { .. }));
    }

    #[test]
    fn test_provenance_tags() {
        assert_eq!(Provenance::ExifMetadata.to_string(), "EXIF");
        assert_eq!(Provenance::ContainerMetadata.to_string(), "VIDEO_META");
        assert_eq!(Provenance::FilesystemModTime.to_string(), "FILE_TIME");
    }
}
