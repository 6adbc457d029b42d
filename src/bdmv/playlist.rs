use super::{ticks_to_seconds, DiscLayout, DiscThresholds};
use crate::utils::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

const MAGIC: &[u8; 4] = b"MPLS";
const HEADER_LEN: usize = 16;
const PLAYLIST_START_OFFSET: usize = 8;
/// length (4) + reserved (2) + item count (2) + sub-path count (2)
const PLAY_ITEM_BLOCK_HEADER_LEN: usize = 10;
const ITEM_COUNT_OFFSET: usize = 6;
const CLIP_NAME_OFFSET: usize = 2;
const CLIP_NAME_LEN: usize = 5;
const TIMESTAMP_OFFSET: usize = 14;

/// One retained play-item: a resolved stream segment plus its trim points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayItem {
    pub filename: String,
    pub in_time: u32,
    pub out_time: u32,
    pub path: PathBuf,
}

impl PlayItem {
    pub fn duration_seconds(&self) -> f64 {
        ticks_to_seconds(u64::from(self.out_time.saturating_sub(self.in_time)))
    }

    pub fn in_seconds(&self) -> f64 {
        ticks_to_seconds(u64::from(self.in_time))
    }

    pub fn out_seconds(&self) -> f64 {
        ticks_to_seconds(u64::from(self.out_time))
    }
}

/// Play-items of one playlist descriptor, in playback order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Playlist {
    pub items: Vec<PlayItem>,
}

impl Playlist {
    pub fn duration_seconds(&self) -> f64 {
        self.items.iter().map(PlayItem::duration_seconds).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawEntry {
    length: u16,
    clip_number: u32,
    in_time: u32,
    out_time: u32,
}

/// Decodes MPLS playlist descriptors into resolved play-items.
#[derive(Debug, Clone)]
pub struct PlaylistParser {
    stream_dir: PathBuf,
    thresholds: DiscThresholds,
}

impl PlaylistParser {
    pub fn new(layout: &DiscLayout, thresholds: DiscThresholds) -> Self {
        Self {
            stream_dir: layout.stream_dir.clone(),
            thresholds,
        }
    }

    /// Parses one descriptor.
    ///
    /// Only a bad magic tag or a truncated header is an error. A malformed
    /// entry ends item parsing and the items read so far are returned.
    pub fn parse(&self, data: &[u8]) -> Result<Playlist> {
        let block_start = read_header(data)?;

        if block_start + PLAY_ITEM_BLOCK_HEADER_LEN > data.len() {
            return Err(Error::format(format!(
                "play-item block at offset {} exceeds file length {}",
                block_start,
                data.len()
            )));
        }

        let item_count = read_u16(data, block_start + ITEM_COUNT_OFFSET)?;
        let mut position = block_start + PLAY_ITEM_BLOCK_HEADER_LEN;
        let mut items = Vec::new();

        for index in 0..item_count {
            let entry = match decode_entry(data, position) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        "Stopping at play-item {} of {}: {}",
                        index + 1,
                        item_count,
                        e
                    );
                    break;
                }
            };

            if let Some(item) = self.resolve(&entry) {
                items.push(item);
            }

            position += usize::from(entry.length) + 2;
        }

        Ok(Playlist { items })
    }

    fn resolve(&self, entry: &RawEntry) -> Option<PlayItem> {
        let filename = format!(
            "{:05}.{}",
            entry.clip_number, self.thresholds.segment_extension
        );

        if entry.out_time <= entry.in_time {
            debug!(
                "Ignoring {}: out time {} does not follow in time {}",
                filename, entry.out_time, entry.in_time
            );
            return None;
        }

        let duration = ticks_to_seconds(u64::from(entry.out_time - entry.in_time));
        if duration < self.thresholds.min_item_seconds {
            debug!("Ignoring {}: {:.2}s is below the clip minimum", filename, duration);
            return None;
        }

        let path = self.stream_dir.join(&filename);
        if !path.exists() {
            warn!("Segment file not found: {}", path.display());
            return None;
        }

        Some(PlayItem {
            filename,
            in_time: entry.in_time,
            out_time: entry.out_time,
            path,
        })
    }
}

/// Validates the magic tag and returns the play-item block offset.
fn read_header(data: &[u8]) -> Result<usize> {
    if data.len() < HEADER_LEN {
        return Err(Error::format(format!(
            "file too short for a playlist header ({} bytes)",
            data.len()
        )));
    }

    if &data[..MAGIC.len()] != MAGIC {
        return Err(Error::format(format!(
            "unexpected type indicator {:?}",
            String::from_utf8_lossy(&data[..MAGIC.len()])
        )));
    }

    let offset = read_u32(data, PLAYLIST_START_OFFSET).map_err(|_| {
        Error::format("truncated playlist start offset")
    })?;
    Ok(offset as usize)
}

fn decode_entry(data: &[u8], position: usize) -> Result<RawEntry> {
    let length = read_u16(data, position)?;

    let name_start = position + CLIP_NAME_OFFSET;
    let clip_name: [u8; CLIP_NAME_LEN] = data
        .get(name_start..name_start + CLIP_NAME_LEN)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| Error::decode(format!("clip name at {} is truncated", name_start)))?;

    let in_time = read_u32(data, position + TIMESTAMP_OFFSET)?;
    let out_time = read_u32(data, position + TIMESTAMP_OFFSET + 4)?;

    Ok(RawEntry {
        length,
        clip_number: decode_clip_number(&clip_name),
        in_time,
        out_time,
    })
}

/// Clip names are zero-padded ASCII digits. Anything else is read as a
/// big-endian integer from the last four bytes.
pub(crate) fn decode_clip_number(raw: &[u8; CLIP_NAME_LEN]) -> u32 {
    std::str::from_utf8(raw)
        .ok()
        .map(|s| s.trim_matches('\0'))
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or_else(|| u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]))
}

fn read_u16(data: &[u8], position: usize) -> Result<u16> {
    data.get(position..position + 2)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u16::from_be_bytes)
        .ok_or_else(|| Error::decode(format!("16-bit field at {} is truncated", position)))
}

fn read_u32(data: &[u8], position: usize) -> Result<u32> {
    data.get(position..position + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| Error::decode(format!("32-bit field at {} is truncated", position)))
}
