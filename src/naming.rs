//! Canonical file names and collision-free allocation
//!
//! Names look like `IMG_20250105_100000.jpg`. When a second file lands on
//! the same capture second, the first one is renamed to `_001` and the new
//! one takes the next free sequence number, so a base name is either used
//! bare by a single file or only with `_NNN` suffixes.

use crate::error::{Error, Result};
use crate::media::MediaKind;
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Highest sequence number before falling back to a sub-second discriminator
pub const MAX_SEQUENCE: u32 = 999;

/// Upper bound on fallback draws; each draw is a fresh candidate
const MAX_FALLBACK_ATTEMPTS: u32 = 1_000_000;

static CANONICAL_STEM: OnceLock<Regex> = OnceLock::new();

fn canonical_stem() -> &'static Regex {
    CANONICAL_STEM.get_or_init(|| {
        Regex::new(r"^(IMG|VID)_\d{8}_\d{6}(?:_\d{3})?$").expect("canonical name pattern is valid")
    })
}

/// Whether `stem` (a file name without extension) is canonical for `kind`
pub fn is_canonical_name(stem: &str, kind: MediaKind) -> bool {
    canonical_stem()
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .is_some_and(|prefix| prefix.as_str() == kind.prefix())
}

/// `PREFIX_YYYYMMDD_HHMMSS` for a timestamp
pub fn canonical_base(timestamp: &NaiveDateTime, kind: MediaKind) -> String {
    format!("{}_{}", kind.prefix(), timestamp.format("%Y%m%d_%H%M%S"))
}

/// Year-month directory name, e.g. `2025-01`
pub fn year_month_dir(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m").to_string()
}

/// Parse a `YYYY-MM` directory name into (year, month)
pub fn parse_year_month(name: &str) -> Option<(i32, u32)> {
    let bytes = name.as_bytes();
    let digits = |range: &[u8]| range.iter().all(u8::is_ascii_digit);
    if bytes.len() != 7 || bytes[4] != b'-' || !digits(&bytes[..4]) || !digits(&bytes[5..]) {
        return None;
    }
    let year: i32 = name[..4].parse().ok()?;
    let month: u32 = name[5..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1).map(|_| (year, month))
}

/// How a name was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationKind {
    /// The original name was already canonical
    Unchanged,
    /// The bare base name was free
    Base,
    /// A `_NNN` suffix was needed
    Sequenced(u32),
    /// All sequence numbers were taken
    Fallback,
}

/// Result of allocating a name inside a target directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// File name to move the current file to
    pub file_name: String,
    /// Occupant renamed from the bare base name to `_001`, if any
    pub renamed: Option<(PathBuf, PathBuf)>,
    pub kind: AllocationKind,
}

/// Allocates canonical names from the state of the target directory
///
/// Every existence check and the rename-then-allocate sequence happen inside
/// `allocate`, which takes `&mut self`; callers sharing an allocator across
/// threads have to serialize on it. Nothing guards against other processes
/// writing the same directory.
#[derive(Debug, Default)]
pub struct NameAllocator;

impl NameAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Decide the final file name for a file captured at `timestamp`
    ///
    /// `ext` is the lower-cased extension including the dot; a canonical name
    /// keeps its stem and gets `ext`. Fails only when an existing occupant
    /// cannot be renumbered.
    pub fn allocate(
        &mut self,
        target_dir: &Path,
        original_name: &str,
        timestamp: &NaiveDateTime,
        ext: &str,
        kind: MediaKind,
    ) -> Result<Allocation> {
        let stem = Path::new(original_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(original_name);
        if is_canonical_name(stem, kind) {
            debug!(original_name, "Name already canonical");
            // Keep the stem, but the extension follows the same casing as new names
            return Ok(Allocation {
                file_name: format!("{}{}", stem, ext),
                renamed: None,
                kind: AllocationKind::Unchanged,
            });
        }

        let base = canonical_base(timestamp, kind);
        let base_name = format!("{}{}", base, ext);
        if !target_dir.join(&base_name).exists() {
            return Ok(Allocation {
                file_name: base_name,
                renamed: None,
                kind: AllocationKind::Base,
            });
        }

        // Same capture second as an existing file: renumber it, then take the next slot
        let renamed = self.renumber_occupant(target_dir, &base, ext)?;

        for seq in 1..=MAX_SEQUENCE {
            let candidate = sequenced_name(&base, seq, ext);
            if !target_dir.join(&candidate).exists() {
                debug!(%candidate, seq, "Allocated sequence number");
                return Ok(Allocation {
                    file_name: candidate,
                    renamed,
                    kind: AllocationKind::Sequenced(seq),
                });
            }
        }

        let file_name = self.fallback_name(target_dir, &base, ext);
        warn!(
            %base,
            %file_name,
            "All {} sequence numbers taken, using sub-second fallback name",
            MAX_SEQUENCE
        );
        Ok(Allocation {
            file_name,
            renamed,
            kind: AllocationKind::Fallback,
        })
    }

    /// Move the bare `base+ext` occupant to `base_001+ext`
    fn renumber_occupant(
        &mut self,
        target_dir: &Path,
        base: &str,
        ext: &str,
    ) -> Result<Option<(PathBuf, PathBuf)>> {
        let from = target_dir.join(format!("{}{}", base, ext));
        let to = target_dir.join(sequenced_name(base, 1, ext));

        if to.exists() {
            return Err(Error::RenameConflict { from, to });
        }

        fs::rename(&from, &to)?;
        info!(from = ?from, to = ?to, "Renumbered existing file");
        Ok(Some((from, to)))
    }

    fn fallback_name(&mut self, target_dir: &Path, base: &str, ext: &str) -> String {
        let start = Local::now().nanosecond() % 1_000_000_000;

        (0..MAX_FALLBACK_ATTEMPTS)
            .map(|offset| format!("{}_{:09}{}", base, (start + offset) % 1_000_000_000, ext))
            .find(|candidate| !target_dir.join(candidate).exists())
            .unwrap_or_else(|| format!("{}_{:09}{}", base, start, ext))
    }
}

fn sequenced_name(base: &str, seq: u32, ext: &str) -> String {
    format!("{}_{:03}{}", base, seq, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ts() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-01-05 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_canonical_name_shapes() {
        assert!(is_canonical_name("IMG_20250105_100000", MediaKind::Image));
        assert!(is_canonical_name("IMG_20250105_100000_007", MediaKind::Image));
        assert!(is_canonical_name("VID_20250105_100000", MediaKind::Video));
        assert!(!is_canonical_name("VID_20250105_100000", MediaKind::Image));
        assert!(!is_canonical_name("IMG_20250105_100000_07", MediaKind::Image));
        assert!(!is_canonical_name("IMG_20250105_100000_abc", MediaKind::Image));
        assert!(!is_canonical_name("IMG_2025010_1000000", MediaKind::Image));
        assert!(!is_canonical_name("DSC_0001", MediaKind::Image));
    }

    #[test]
    fn test_year_month_round_trip() {
        let dir = year_month_dir(&ts());
        assert_eq!(dir, "2025-01");
        assert_eq!(parse_year_month(&dir), Some((2025, 1)));
        assert_eq!(parse_year_month("2025-13"), None);
        assert_eq!(parse_year_month("2025_01"), None);
        assert_eq!(parse_year_month("25-01"), None);
        assert_eq!(parse_year_month("abcd-01"), None);
        assert_eq!(parse_year_month("2025-+1"), None);
        assert_eq!(parse_year_month("+025-01"), None);
    }

    #[test]
    fn test_canonical_name_returned_unchanged() {
        let dir = tempdir().unwrap();
        let alloc = NameAllocator::new()
            .allocate(dir.path(), "IMG_20250105_100000_007.jpg", &ts(), ".jpg", MediaKind::Image)
            .unwrap();
        assert_eq!(alloc.file_name, "IMG_20250105_100000_007.jpg");
        assert_eq!(alloc.kind, AllocationKind::Unchanged);

        // The timestamp does not matter for a canonical name
        let other = ts() + chrono::Duration::days(400);
        let alloc = NameAllocator::new()
            .allocate(dir.path(), "IMG_20250105_100000_007.jpg", &other, ".jpg", MediaKind::Image)
            .unwrap();
        assert_eq!(alloc.file_name, "IMG_20250105_100000_007.jpg");
    }

    #[test]
    fn test_canonical_name_gets_lowercase_extension() {
        let dir = tempdir().unwrap();
        let alloc = NameAllocator::new()
            .allocate(dir.path(), "IMG_20250105_100000.JPG", &ts(), ".jpg", MediaKind::Image)
            .unwrap();
        assert_eq!(alloc.file_name, "IMG_20250105_100000.jpg");
        assert_eq!(alloc.kind, AllocationKind::Unchanged);
    }

    #[test]
    fn test_free_base_name() {
        let dir = tempdir().unwrap();
        let alloc = NameAllocator::new()
            .allocate(dir.path(), "DSC0001.JPG", &ts(), ".jpg", MediaKind::Image)
            .unwrap();
        assert_eq!(alloc.file_name, "IMG_20250105_100000.jpg");
        assert_eq!(alloc.kind, AllocationKind::Base);
        assert!(alloc.renamed.is_none());

        let alloc = NameAllocator::new()
            .allocate(dir.path(), "clip.mov", &ts(), ".mov", MediaKind::Video)
            .unwrap();
        assert_eq!(alloc.file_name, "VID_20250105_100000.mov");
    }

    #[test]
    fn test_collision_renumbers_occupant() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("IMG_20250105_100000.jpg"), b"first").unwrap();

        let alloc = NameAllocator::new()
            .allocate(dir.path(), "second.jpg", &ts(), ".jpg", MediaKind::Image)
            .unwrap();

        assert_eq!(alloc.file_name, "IMG_20250105_100000_002.jpg");
        assert_eq!(alloc.kind, AllocationKind::Sequenced(2));
        assert_eq!(
            alloc.renamed,
            Some((
                dir.path().join("IMG_20250105_100000.jpg"),
                dir.path().join("IMG_20250105_100000_001.jpg"),
            ))
        );
        assert_eq!(names_in(dir.path()), vec!["IMG_20250105_100000_001.jpg"]);
        assert_eq!(fs::read(dir.path().join("IMG_20250105_100000_001.jpg")).unwrap(), b"first");
    }

    #[test]
    fn test_sequence_skips_taken_numbers() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("IMG_20250105_100000.jpg"), b"bare").unwrap();
        fs::write(dir.path().join("IMG_20250105_100000_002.jpg"), b"two").unwrap();
        fs::write(dir.path().join("IMG_20250105_100000_003.jpg"), b"three").unwrap();

        let alloc = NameAllocator::new()
            .allocate(dir.path(), "new.jpg", &ts(), ".jpg", MediaKind::Image)
            .unwrap();
        assert_eq!(alloc.file_name, "IMG_20250105_100000_004.jpg");
    }

    #[test]
    fn test_rename_conflict_is_surfaced() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("IMG_20250105_100000.jpg"), b"bare").unwrap();
        fs::write(dir.path().join("IMG_20250105_100000_001.jpg"), b"one").unwrap();

        let err = NameAllocator::new()
            .allocate(dir.path(), "new.jpg", &ts(), ".jpg", MediaKind::Image)
            .unwrap_err();
        assert!(matches!(err, Error::RenameConflict { .. }));

        // Nothing was overwritten
        assert_eq!(fs::read(dir.path().join("IMG_20250105_100000.jpg")).unwrap(), b"bare");
        assert_eq!(fs::read(dir.path().join("IMG_20250105_100000_001.jpg")).unwrap(), b"one");
    }

    #[test]
    fn test_exhausted_sequence_falls_back() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("IMG_20250105_100000.jpg"), b"bare").unwrap();
        for seq in 2..=MAX_SEQUENCE {
            let name = sequenced_name("IMG_20250105_100000", seq, ".jpg");
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let alloc = NameAllocator::new()
            .allocate(dir.path(), "one-too-many.jpg", &ts(), ".jpg", MediaKind::Image)
            .unwrap();

        assert_eq!(alloc.kind, AllocationKind::Fallback);
        assert!(alloc.file_name.starts_with("IMG_20250105_100000_"));
        assert!(alloc.file_name.ends_with(".jpg"));
        assert!(!dir.path().join(&alloc.file_name).exists());
        // 9-digit discriminator never collides with a 3-digit sequence
        assert_eq!(alloc.file_name.len(), "IMG_20250105_100000_".len() + 9 + 4);
    }
}
