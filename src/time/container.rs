//! Creation time from MP4/QuickTime container boxes
//!
//! The creation time can live in the movie header (`moov/mvhd`) and in each
//! track's media header (`moov/trak/mdia/mdhd`). The movie header wins; a
//! media header is only used when the movie value is missing or a sentinel.
//! Values count seconds from 1904-01-01 UTC.

use super::{MetadataSource, Provenance};
use crate::error::{Error, Result};
use crate::media::MediaKind;
use chrono::{DateTime, Local, NaiveDateTime};
use mp4::{BoxHeader, BoxType, MdhdBox, MvhdBox, ReadBox};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::trace;

/// Seconds between the MP4 epoch (1904) and the Unix epoch
const SECONDS_FROM_1904_TO_1970: u64 = 2_082_844_800;

const HEADER_SIZE: u64 = 8;

/// Reads the creation time stored in a video container
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerSource;

impl MetadataSource for ContainerSource {
    fn provenance(&self) -> Provenance {
        Provenance::ContainerMetadata
    }

    fn applies_to(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Video
    }

    fn read_time(&self, path: &Path) -> Result<NaiveDateTime> {
        extract_container_time(path)
    }
}

/// Raw creation times found in a container, in MP4 epoch seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreationTimes {
    /// `mvhd` creation time
    pub movie: Option<u64>,
    /// First non-sentinel `mdhd` creation time, or the first seen if all are sentinels
    pub media: Option<u64>,
}

impl CreationTimes {
    /// Movie-level value unless absent or a sentinel, then media-level
    pub fn select(&self) -> Option<u64> {
        self.movie
            .filter(|raw| !is_sentinel(*raw))
            .or_else(|| self.media.filter(|raw| !is_sentinel(*raw)))
    }
}

/// Zero means "never written". A value landing exactly on the Unix epoch is
/// treated the same way, since it comes from encoders that wrote 0 as Unix time.
fn is_sentinel(raw: u64) -> bool {
    raw == 0 || raw == SECONDS_FROM_1904_TO_1970
}

/// Extract the container creation time, converted to local wall-clock time
pub fn extract_container_time(path: &Path) -> Result<NaiveDateTime> {
    let file = File::open(path).map_err(|e| Error::metadata_unavailable(path, e.to_string()))?;
    let size = file
        .metadata()
        .map_err(|e| Error::metadata_unavailable(path, e.to_string()))?
        .len();
    let mut reader = BufReader::new(file);

    let times = read_creation_times(&mut reader, size)
        .map_err(|e| Error::metadata_unavailable(path, format!("malformed container: {}", e)))?;
    trace!(?path, ?times, "Container creation times");

    let raw = times
        .select()
        .ok_or_else(|| Error::metadata_unavailable(path, "no creation time in container"))?;

    mp4_time_to_local(raw).ok_or_else(|| {
        Error::metadata_unavailable(path, format!("creation time {} out of range", raw))
    })
}

/// Walk the box tree and collect `mvhd` and `mdhd` creation times
pub fn read_creation_times<R: Read + Seek>(
    reader: &mut R,
    size: u64,
) -> std::result::Result<CreationTimes, mp4::Error> {
    let mut times = CreationTimes::default();
    reader.seek(SeekFrom::Start(0))?;
    walk_boxes(reader, size, &mut times)?;
    Ok(times)
}

fn walk_boxes<R: Read + Seek>(
    reader: &mut R,
    end: u64,
    times: &mut CreationTimes,
) -> std::result::Result<(), mp4::Error> {
    let mut pos = reader.stream_position()?;

    while pos + HEADER_SIZE <= end {
        let header = BoxHeader::read(reader)?;
        let header_len = reader.stream_position()? - pos;

        // BoxHeader reports 64-bit sizes minus the extra size field
        let box_end = match header.size {
            0 => Some(end),
            size => pos
                .checked_add(size)
                .and_then(|n| n.checked_add(header_len - HEADER_SIZE)),
        }
        .filter(|box_end| *box_end <= end && *box_end >= pos + header_len)
        .ok_or(mp4::Error::InvalidData("box size out of range"))?;

        match header.name {
            BoxType::MoovBox | BoxType::TrakBox | BoxType::MdiaBox => {
                walk_boxes(reader, box_end, times)?;
            }
            BoxType::MvhdBox => {
                let mvhd = MvhdBox::read_box(reader, header.size)?;
                times.movie.get_or_insert(mvhd.creation_time);
            }
            BoxType::MdhdBox => {
                let mdhd = MdhdBox::read_box(reader, header.size)?;
                if times.media.is_none_or(is_sentinel) {
                    times.media = Some(mdhd.creation_time);
                }
            }
            _ => {}
        }

        reader.seek(SeekFrom::Start(box_end))?;
        pos = box_end;
    }

    Ok(())
}

fn mp4_time_to_local(raw: u64) -> Option<NaiveDateTime> {
    let unix = i64::try_from(raw).ok()? - SECONDS_FROM_1904_TO_1970 as i64;
    let utc = DateTime::from_timestamp(unix, 0)?;
    Some(utc.with_timezone(&Local).naive_local())
}
