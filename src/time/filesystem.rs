//! File system modification time, the last resort of the chain

use super::{MetadataSource, Provenance};
use crate::error::Result;
use crate::media::MediaKind;
use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::path::Path;

/// Reads the modification time; applies to every kind
#[derive(Debug, Clone, Copy, Default)]
pub struct ModTimeSource;

impl MetadataSource for ModTimeSource {
    fn provenance(&self) -> Provenance {
        Provenance::FilesystemModTime
    }

    fn applies_to(&self, _kind: MediaKind) -> bool {
        true
    }

    fn read_time(&self, path: &Path) -> Result<NaiveDateTime> {
        let modified = fs::metadata(path)?.modified()?;
        let datetime: DateTime<Local> = modified.into();
        Ok(datetime.naive_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use filetime::FileTime;
    use tempfile::tempdir;

    #[test]
    fn test_reads_mtime_as_local_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        fs::write(&path, b"not really a png").unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_736_071_200, 0)).unwrap();

        let expected = DateTime::from_timestamp(1_736_071_200, 0)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(ModTimeSource.read_time(&path).unwrap(), expected);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ModTimeSource.read_time(Path::new("/no/such/file.png")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
