//! Blu-ray disc structure analysis
//!
//! Reads the `BDMV/PLAYLIST/*.mpls` descriptors of a ripped disc, resolves
//! their play-items against `BDMV/STREAM`, and picks the playlist that most
//! likely holds the main feature.

pub mod concat;
pub mod playlist;
pub mod selector;

pub use concat::{build_concat_manifest, write_concat_manifest};
pub use playlist::{PlayItem, Playlist, PlaylistParser};
pub use selector::{derive_title_label, select, TitleCandidate, TitleDescriptor, TitleSelector};

use crate::config::DiscConfig;
use std::path::{Path, PathBuf};

/// Playlist timestamps run on a 45 kHz clock.
pub const CLOCK_TICKS_PER_SECOND: f64 = 45_000.0;

/// Play-items shorter than this are menus or bonus loops.
pub const DEFAULT_MIN_ITEM_SECONDS: f64 = 30.0;

/// A playlist must run longer than this to count as a feature.
pub const DEFAULT_MIN_FEATURE_SECONDS: f64 = 3600.0;

pub const DEFAULT_SEGMENT_EXTENSION: &str = "m2ts";

pub const PLAYLIST_EXTENSION: &str = "mpls";

/// Converts a span of clock ticks into seconds.
pub fn ticks_to_seconds(ticks: u64) -> f64 {
    ticks as f64 / CLOCK_TICKS_PER_SECOND
}

/// Heuristic thresholds used while scanning a disc.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscThresholds {
    pub min_item_seconds: f64,
    pub min_feature_seconds: f64,
    pub segment_extension: String,
}

impl Default for DiscThresholds {
    fn default() -> Self {
        Self {
            min_item_seconds: DEFAULT_MIN_ITEM_SECONDS,
            min_feature_seconds: DEFAULT_MIN_FEATURE_SECONDS,
            segment_extension: DEFAULT_SEGMENT_EXTENSION.to_string(),
        }
    }
}

impl From<&DiscConfig> for DiscThresholds {
    fn from(config: &DiscConfig) -> Self {
        Self {
            min_item_seconds: config.min_item_seconds,
            min_feature_seconds: config.min_feature_seconds,
            segment_extension: config.segment_extension.clone(),
        }
    }
}

/// Directory layout of a ripped disc rooted at `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscLayout {
    pub root: PathBuf,
    pub playlist_dir: PathBuf,
    pub stream_dir: PathBuf,
}

impl DiscLayout {
    /// Relative roots are made absolute against the working directory, so
    /// every resolved segment path stays valid from a manifest elsewhere.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let bdmv = root.join("BDMV");
        Self {
            playlist_dir: bdmv.join("PLAYLIST"),
            stream_dir: bdmv.join("STREAM"),
            root,
        }
    }

    /// True when `path` looks like a disc root (has `BDMV/PLAYLIST`).
    pub fn is_disc_root<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().join("BDMV").join("PLAYLIST").is_dir()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Builders for synthetic playlist files and disc trees.

    use super::DiscLayout;
    use std::fs;
    use std::path::Path;

    pub struct EntrySpec {
        pub clip: [u8; 5],
        pub in_time: u32,
        pub out_time: u32,
    }

    impl EntrySpec {
        pub fn new(clip: u32, in_time: u32, out_time: u32) -> Self {
            let digits = format!("{:05}", clip);
            let mut name = [0u8; 5];
            name.copy_from_slice(digits.as_bytes());
            Self {
                clip: name,
                in_time,
                out_time,
            }
        }

        /// Entry lasting `seconds`, starting at tick 0.
        pub fn seconds(clip: u32, seconds: u32) -> Self {
            Self::new(clip, 0, seconds * 45_000)
        }
    }

    /// Builds an MPLS-shaped byte buffer. Each entry body is 20 bytes:
    /// clip name (5), codec id (4), padding (3), in (4), out (4).
    pub fn playlist_bytes(entries: &[EntrySpec]) -> Vec<u8> {
        let offset: u32 = 16;
        let mut data = Vec::new();
        data.extend_from_slice(b"MPLS");
        data.extend_from_slice(b"0200");
        data.extend_from_slice(&offset.to_be_bytes());
        data.extend_from_slice(&[0u8; 4]);

        let block_len = (6 + entries.len() * 22) as u32;
        data.extend_from_slice(&block_len.to_be_bytes());
        data.extend_from_slice(&[0u8; 2]);
        data.extend_from_slice(&(entries.len() as u16).to_be_bytes());
        data.extend_from_slice(&[0u8; 2]);

        for entry in entries {
            data.extend_from_slice(&20u16.to_be_bytes());
            data.extend_from_slice(&entry.clip);
            data.extend_from_slice(b"M2TS");
            data.extend_from_slice(&[0u8; 3]);
            data.extend_from_slice(&entry.in_time.to_be_bytes());
            data.extend_from_slice(&entry.out_time.to_be_bytes());
        }
        data
    }

    /// Creates `BDMV/PLAYLIST` and `BDMV/STREAM` under `root`.
    pub fn create_disc(root: &Path) -> DiscLayout {
        let layout = DiscLayout::new(root);
        fs::create_dir_all(&layout.playlist_dir).unwrap();
        fs::create_dir_all(&layout.stream_dir).unwrap();
        layout
    }

    pub fn write_segment(layout: &DiscLayout, clip: u32, size: usize) {
        let path = layout.stream_dir.join(format!("{:05}.m2ts", clip));
        fs::write(path, vec![0u8; size]).unwrap();
    }

    pub fn write_playlist(layout: &DiscLayout, name: &str, entries: &[EntrySpec]) {
        fs::write(layout.playlist_dir.join(name), playlist_bytes(entries)).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_to_seconds() {
        assert_eq!(ticks_to_seconds(45_000), 1.0);
        assert_eq!(ticks_to_seconds(1_350_000), 30.0);
    }

    #[test]
    fn test_disc_layout_paths() {
        let layout = DiscLayout::new("/rips/Movie.2001");
        assert_eq!(layout.playlist_dir, Path::new("/rips/Movie.2001/BDMV/PLAYLIST"));
        assert_eq!(layout.stream_dir, Path::new("/rips/Movie.2001/BDMV/STREAM"));
    }

    #[test]
    fn test_relative_root_becomes_absolute() {
        let layout = DiscLayout::new("Movie.2001");
        let cwd = std::env::current_dir().unwrap();
        assert!(layout.root.is_absolute());
        assert_eq!(layout.root, cwd.join("Movie.2001"));
        assert_eq!(layout.stream_dir, cwd.join("Movie.2001/BDMV/STREAM"));
    }

    #[test]
    fn test_is_disc_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!DiscLayout::is_disc_root(dir.path()));
        test_support::create_disc(dir.path());
        assert!(DiscLayout::is_disc_root(dir.path()));
    }
}
