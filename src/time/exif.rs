//! EXIF capture time for images

use super::{MetadataSource, Provenance};
use crate::error::{Error, Result};
use crate::media::MediaKind;
use chrono::{NaiveDate, NaiveDateTime};
use exif::{Field, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// EXIF tags to try for date extraction, in priority order
const DATE_TAGS: &[Tag] = &[
    Tag::DateTimeOriginal, // When the original image was taken
    Tag::DateTime,         // Last written by camera or editor
];

/// Reads the original capture date from an image's EXIF block
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifSource;

impl MetadataSource for ExifSource {
    fn provenance(&self) -> Provenance {
        Provenance::ExifMetadata
    }

    fn applies_to(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Image
    }

    fn read_time(&self, path: &Path) -> Result<NaiveDateTime> {
        extract_exif_time(path)
    }
}

/// Extract capture time from EXIF metadata
pub fn extract_exif_time(path: &Path) -> Result<NaiveDateTime> {
    let file = File::open(path).map_err(|e| Error::metadata_unavailable(path, e.to_string()))?;
    let mut reader = BufReader::new(file);

    let exif = Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| Error::metadata_unavailable(path, e.to_string()))?;

    for tag in DATE_TAGS {
        if let Some(field) = exif.get_field(*tag, In::PRIMARY)
            && let Some(datetime) = field_datetime(field)
        {
            trace!(?path, ?tag, "Found EXIF date");
            return Ok(datetime);
        }
    }

    Err(Error::metadata_unavailable(path, "no valid date tag in EXIF data"))
}

fn field_datetime(field: &Field) -> Option<NaiveDateTime> {
    if let Value::Ascii(ref parts) = field.value
        && let Some(raw) = parts.first()
        && let Ok(dt) = exif::DateTime::from_ascii(raw)
    {
        // All-zero dates written by some cameras fail here and count as absent
        return NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?
            .and_hms_opt(dt.hour.into(), dt.minute.into(), dt.second.into());
    }

    parse_exif_datetime(&field.display_value().to_string())
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');

    let formats = [
        "%Y:%m:%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];

    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use exif::experimental::Writer;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn write_tiff(path: &Path, fields: &[Field]) {
        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();
        std::fs::write(path, buf.into_inner()).unwrap();
    }

    fn ascii(tag: Tag, value: &str) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![value.as_bytes().to_vec()]),
        }
    }

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime("2024:01:15 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 0);

        let dt = parse_exif_datetime("\"2024:01:15 14:30:00\"").unwrap();
        assert_eq!(dt.year(), 2024);

        let dt = parse_exif_datetime("2024-01-15 14:30:00").unwrap();
        assert_eq!(dt.day(), 15);

        assert!(parse_exif_datetime("invalid").is_none());
    }

    #[test]
    fn test_reads_date_time_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shot.tif");
        write_tiff(
            &path,
            &[
                ascii(Tag::DateTime, "2025:03:01 08:00:00"),
                ascii(Tag::DateTimeOriginal, "2025:01:05 10:00:00"),
            ],
        );

        let dt = ExifSource.read_time(&path).unwrap();
        assert_eq!(dt.to_string(), "2025-01-05 10:00:00");
    }

    #[test]
    fn test_falls_back_to_date_time_tag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edited.tif");
        write_tiff(&path, &[ascii(Tag::DateTime, "2023:12:31 23:59:59")]);

        let dt = ExifSource.read_time(&path).unwrap();
        assert_eq!(dt.to_string(), "2023-12-31 23:59:59");
    }

    #[test]
    fn test_zero_date_is_unavailable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blank.tif");
        write_tiff(&path, &[ascii(Tag::DateTimeOriginal, "0000:00:00 00:00:00")]);

        let err = ExifSource.read_time(&path).unwrap_err();
        assert!(matches!(err, Error::MetadataUnavailable { .. }));
    }

    #[test]
    fn test_no_exif_is_soft_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let err = ExifSource.read_time(&path).unwrap_err();
        assert!(matches!(err, Error::MetadataUnavailable { .. }));
    }
}
