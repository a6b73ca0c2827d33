//! Directory classifier
//!
//! Handles the per-run logic of:
//! - Walking the root directory
//! - Skipping files already inside a `YYYY-MM` folder
//! - Resolving capture times and allocating canonical names
//! - Moving files into `root/YYYY-MM/`

use crate::config::Config;
use crate::error::{Error, Result};
use crate::media::MediaFile;
use crate::naming::{AllocationKind, NameAllocator, parse_year_month, year_month_dir};
use crate::time::{Provenance, ResolvedTime, TimeResolver};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};
use walkdir::WalkDir;

/// Why a file was left where it is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No capture time could be determined
    TimeUnavailable(String),
    /// The year-month directory could not be created
    DirectoryCreateFailed(String),
    /// The final target name is taken; existing files are never overwritten
    TargetExists(PathBuf),
    /// Renumbering the existing occupant to `_001` would overwrite a file
    RenameConflict(String),
    /// Any other I/O failure while renaming or moving
    Io(String),
}

impl SkipReason {
    fn from_error(error: Error) -> Self {
        match error {
            Error::TimeUnavailable { .. } => SkipReason::TimeUnavailable(error.to_string()),
            Error::DirectoryCreateFailed { .. } => {
                SkipReason::DirectoryCreateFailed(error.to_string())
            }
            Error::TargetExists { path } => SkipReason::TargetExists(path),
            Error::RenameConflict { .. } => SkipReason::RenameConflict(error.to_string()),
            other => SkipReason::Io(other.to_string()),
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TimeUnavailable(msg)
            | SkipReason::DirectoryCreateFailed(msg)
            | SkipReason::RenameConflict(msg)
            | SkipReason::Io(msg) => f.write_str(msg),
            SkipReason::TargetExists(path) => {
                write!(f, "Target file {} already exists", path.display())
            }
        }
    }
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Moved into its year-month directory
    Moved {
        destination: PathBuf,
        renamed: bool,
    },
    /// Left in place
    Skipped(SkipReason),
}

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub time: Option<ResolvedTime>,
    pub status: FileStatus,
}

/// Winning time source counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvenanceCounts {
    pub exif: usize,
    pub container: usize,
    pub filesystem: usize,
}

impl ProvenanceCounts {
    fn record(&mut self, provenance: Provenance) {
        match provenance {
            Provenance::ExifMetadata => self.exif += 1,
            Provenance::ContainerMetadata => self.container += 1,
            Provenance::FilesystemModTime => self.filesystem += 1,
        }
    }
}

/// Counters and per-file outcomes of one run
#[derive(Debug, Clone, Default)]
pub struct ClassifyReport {
    /// Supported files outside year-month directories
    pub found: usize,
    pub moved: usize,
    pub skipped: usize,
    /// Supported files already inside a year-month directory
    pub already_classified: usize,
    /// Existing files renamed to `_001`
    pub renumbered: usize,
    pub provenance: ProvenanceCounts,
    pub outcomes: Vec<FileOutcome>,
}

impl ClassifyReport {
    pub fn summary(&self) -> String {
        format!(
            "Found: {}, Moved: {}, Skipped: {}, Already classified: {}, Renumbered: {}",
            self.found, self.moved, self.skipped, self.already_classified, self.renumbered
        )
    }

    fn record(&mut self, outcome: FileOutcome) {
        if let Some(time) = &outcome.time {
            self.provenance.record(time.provenance);
        }
        match &outcome.status {
            FileStatus::Moved { renamed, .. } => {
                self.moved += 1;
                if *renamed {
                    self.renumbered += 1;
                }
            }
            FileStatus::Skipped(_) => self.skipped += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Walks a root directory and files media into `root/YYYY-MM/`
pub struct Classifier {
    config: Config,
    resolver: TimeResolver,
    allocator: NameAllocator,
}

impl Classifier {
    /// Create a classifier with the standard time source chain
    pub fn new(config: Config) -> Self {
        Self::with_resolver(config, TimeResolver::new())
    }

    /// Create a classifier with a custom time resolver
    pub fn with_resolver(config: Config, resolver: TimeResolver) -> Self {
        Self {
            config,
            resolver,
            allocator: NameAllocator::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one classification pass over the root directory
    ///
    /// Per-file problems are recorded as skips; only a traversal error aborts
    /// the run. Files moved before the error stay moved.
    pub fn run(&mut self) -> Result<ClassifyReport> {
        let _span = span!(Level::INFO, "classify_run", root = ?self.config.root_dir).entered();

        let root = self.config.root_dir.clone();
        if !root.is_dir() {
            return Err(Error::Config(format!("{} is not a directory", root.display())));
        }

        info!("Scanning root directory...");
        let files = self.collect_files(&root)?;

        let mut report = ClassifyReport::default();
        for file in files {
            if is_already_classified(&root, &file.path) {
                debug!(path = ?file.path, "Already in a year-month directory, skipping");
                report.already_classified += 1;
                continue;
            }

            report.found += 1;
            let outcome = self.process_file(&root, &file);
            report.record(outcome);
        }

        info!("{}", report.summary());
        Ok(report)
    }

    /// Collect supported files, sorted by path within each directory
    fn collect_files(&self, root: &Path) -> Result<Vec<MediaFile>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(file) = MediaFile::from_path(entry.path(), &self.config) {
                files.push(file);
            }
        }

        debug!(count = files.len(), "Collected media files");
        Ok(files)
    }

    fn process_file(&mut self, root: &Path, file: &MediaFile) -> FileOutcome {
        let _file_span = span!(Level::DEBUG, "process_file", path = ?file.path).entered();

        let time = match self.resolver.resolve(&file.path, file.kind) {
            Ok(time) => time,
            Err(e) => {
                warn!(path = ?file.path, error = %e, "Could not determine capture time");
                return skipped(file, None, e);
            }
        };

        match self.place_file(root, file, &time) {
            Ok((destination, renamed)) => {
                info!(
                    source = ?file.path,
                    destination = ?destination,
                    provenance = %time.provenance,
                    timestamp = %time.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    "Moved file"
                );
                FileOutcome {
                    source: file.path.clone(),
                    time: Some(time),
                    status: FileStatus::Moved { destination, renamed },
                }
            }
            Err(e) => {
                error!(path = ?file.path, error = %e, "Skipping file");
                skipped(file, Some(time), e)
            }
        }
    }

    /// Create the year-month directory, allocate a name and move the file
    fn place_file(
        &mut self,
        root: &Path,
        file: &MediaFile,
        time: &ResolvedTime,
    ) -> Result<(PathBuf, bool)> {
        let target_dir = root.join(year_month_dir(&time.timestamp));
        fs::create_dir_all(&target_dir).map_err(|e| Error::DirectoryCreateFailed {
            path: target_dir.clone(),
            source: e,
        })?;

        let allocation = self.allocator.allocate(
            &target_dir,
            &file.name,
            &time.timestamp,
            &file.extension,
            file.kind,
        )?;

        let destination = target_dir.join(&allocation.file_name);
        if destination.exists() {
            return Err(Error::TargetExists { path: destination });
        }

        move_file(&file.path, &destination)?;
        let renamed = allocation.renamed.is_some();
        if allocation.kind == AllocationKind::Fallback {
            warn!(destination = ?destination, "Stored under a non-sequential fallback name");
        }
        Ok((destination, renamed))
    }
}

fn skipped(file: &MediaFile, time: Option<ResolvedTime>, error: Error) -> FileOutcome {
    FileOutcome {
        source: file.path.clone(),
        time,
        status: FileStatus::Skipped(SkipReason::from_error(error)),
    }
}

/// Whether the file's immediate parent directory below `root` is named `YYYY-MM`
///
/// Files directly under the root are never classified, whatever the root is called.
pub fn is_already_classified(root: &Path, path: &Path) -> bool {
    path.parent()
        .filter(|p| *p != root && p.starts_with(root))
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .and_then(parse_year_month)
        .is_some()
}

/// Move a file, preserving its modification time
///
/// Tries a rename first, then falls back to copy + delete for
/// cross-filesystem moves.
pub fn move_file(source: &Path, dest: &Path) -> Result<()> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }

    copy_file(source, dest)?;

    let mtime = fs::metadata(source)?.modified()?;
    filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime))?;

    fs::remove_file(source)?;
    Ok(())
}

/// Copy file with buffered I/O
///
/// Never overwrites `dest`; a copy that fails after `dest` was created is removed.
fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let src_file = File::open(source)?;
    let dest_file = File::options().write(true).create_new(true).open(dest)?;

    if let Err(e) = copy_contents(src_file, dest_file) {
        if let Err(cleanup) = fs::remove_file(dest) {
            warn!(dest = ?dest, error = %cleanup, "Could not remove partial copy");
        }
        return Err(e);
    }
    Ok(())
}

fn copy_contents(src_file: File, dest_file: File) -> Result<()> {
    let mut reader = BufReader::with_capacity(256 * 1024, src_file);
    let mut writer = BufWriter::with_capacity(256 * 1024, dest_file);

    let mut buffer = vec![0u8; 256 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }

    writer.flush()?;
    Ok(())
}
