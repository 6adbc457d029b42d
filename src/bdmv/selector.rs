use super::playlist::{PlayItem, Playlist, PlaylistParser};
use super::{DiscLayout, DiscThresholds, PLAYLIST_EXTENSION};
use crate::utils::filesystem::format_file_size;
use crate::utils::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The playlist chosen as the disc's main feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleDescriptor {
    pub items: Vec<PlayItem>,
    /// Sum of retained item durations, in seconds.
    pub duration: f64,
    /// Sum of resolved segment file sizes, in bytes.
    pub size: u64,
    pub title: String,
    /// File name of the playlist the items came from.
    pub playlist: String,
}

impl TitleDescriptor {
    pub fn segment_paths(&self) -> Vec<&Path> {
        self.items.iter().map(|item| item.path.as_path()).collect()
    }
}

/// A parsed playlist waiting for selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleCandidate {
    pub name: String,
    pub playlist: Playlist,
}

/// Picks the longest candidate running over `min_feature_seconds`.
///
/// Candidates must already be in scan order; on equal durations the
/// earlier one wins.
pub fn select(candidates: Vec<TitleCandidate>, min_feature_seconds: f64) -> Option<TitleCandidate> {
    let mut best: Option<(f64, TitleCandidate)> = None;

    for candidate in candidates {
        let duration = candidate.playlist.duration_seconds();
        if duration <= min_feature_seconds {
            continue;
        }

        let replaces = match &best {
            Some((best_duration, _)) => duration > *best_duration,
            None => true,
        };
        if replaces {
            best = Some((duration, candidate));
        }
    }

    best.map(|(_, candidate)| candidate)
}

/// Human title from the disc directory name: `Toy.Story.1995` -> `Toy Story 1995`.
pub fn derive_title_label<P: AsRef<Path>>(disc_root: P) -> String {
    disc_root
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().replace('.', " "))
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Scans a disc's playlists and selects the main feature.
pub struct TitleSelector {
    layout: DiscLayout,
    thresholds: DiscThresholds,
}

impl TitleSelector {
    pub fn new(layout: DiscLayout, thresholds: DiscThresholds) -> Self {
        Self { layout, thresholds }
    }

    pub fn layout(&self) -> &DiscLayout {
        &self.layout
    }

    /// Playlist files in lexical order.
    fn playlist_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.layout.playlist_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| ext.eq_ignore_ascii_case(PLAYLIST_EXTENSION))
                        .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Parses every playlist, skipping unreadable or malformed ones.
    pub fn scan(&self) -> Result<Vec<TitleCandidate>> {
        let parser = PlaylistParser::new(&self.layout, self.thresholds.clone());
        let mut candidates = Vec::new();

        for path in self.playlist_files()? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let data = match std::fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Skipping playlist {}: {}", name, e);
                    continue;
                }
            };

            match parser.parse(&data) {
                Ok(playlist) if playlist.is_empty() => {
                    debug!("Playlist {} has no usable items", name);
                }
                Ok(playlist) => {
                    debug!(
                        "Playlist {}: {} item(s), {:.2}s",
                        name,
                        playlist.items.len(),
                        playlist.duration_seconds()
                    );
                    candidates.push(TitleCandidate { name, playlist });
                }
                Err(e) => warn!("Skipping playlist {}: {}", name, e),
            }
        }

        Ok(candidates)
    }

    /// Returns `None` when no playlist clears the feature-length threshold.
    pub fn find_main_title(&self) -> Result<Option<TitleDescriptor>> {
        info!("Scanning playlists in {}", self.layout.playlist_dir.display());
        let candidates = self.scan()?;

        let Some(winner) = select(candidates, self.thresholds.min_feature_seconds) else {
            warn!(
                "No playlist runs longer than {:.0} seconds",
                self.thresholds.min_feature_seconds
            );
            return Ok(None);
        };

        let size = winner.playlist.items.iter().map(segment_size).sum();
        let descriptor = TitleDescriptor {
            duration: winner.playlist.duration_seconds(),
            size,
            title: derive_title_label(&self.layout.root),
            playlist: winner.name,
            items: winner.playlist.items,
        };

        info!(
            "Selected main title {}: {} item(s), duration {:.2}s, size {}",
            descriptor.playlist,
            descriptor.items.len(),
            descriptor.duration,
            format_file_size(descriptor.size)
        );

        Ok(Some(descriptor))
    }
}

fn segment_size(item: &PlayItem) -> u64 {
    match std::fs::metadata(&item.path) {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            warn!("Cannot stat {}: {}", item.path.display(), e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdmv::test_support::{create_disc, write_playlist, write_segment, EntrySpec};

    fn candidate(name: &str, seconds: &[u32]) -> TitleCandidate {
        let items = seconds
            .iter()
            .enumerate()
            .map(|(i, s)| PlayItem {
                filename: format!("{:05}.m2ts", i),
                in_time: 0,
                out_time: s * 45_000,
                path: PathBuf::from(format!("/disc/BDMV/STREAM/{:05}.m2ts", i)),
            })
            .collect();
        TitleCandidate {
            name: name.to_string(),
            playlist: Playlist { items },
        }
    }

    #[test]
    fn test_select_prefers_longest() {
        let chosen = select(
            vec![candidate("00001.mpls", &[4000]), candidate("00002.mpls", &[2500, 2500])],
            3600.0,
        )
        .unwrap();
        assert_eq!(chosen.name, "00002.mpls");
    }

    #[test]
    fn test_select_tie_goes_to_first() {
        let chosen = select(
            vec![
                candidate("00003.mpls", &[5000]),
                candidate("00004.mpls", &[5000]),
            ],
            3600.0,
        )
        .unwrap();
        assert_eq!(chosen.name, "00003.mpls");
    }

    #[test]
    fn test_select_rejects_short_candidates() {
        // many items, still not long enough
        let many: Vec<u32> = vec![300; 12];
        assert!(select(vec![candidate("00000.mpls", &many)], 3600.0).is_none());
        assert!(select(vec![candidate("00001.mpls", &[3600])], 3600.0).is_none());
        assert!(select(Vec::new(), 3600.0).is_none());
    }

    #[test]
    fn test_derive_title_label() {
        assert_eq!(derive_title_label("/rips/Toy.Story.1995"), "Toy Story 1995");
        assert_eq!(derive_title_label("/rips/.Hidden.Movie."), "Hidden Movie");
        assert_eq!(derive_title_label("/"), "");
    }

    #[test]
    fn test_find_main_title_on_disc() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("The.Movie.2010");
        let layout = create_disc(&root);
        write_segment(&layout, 1, 100);
        write_segment(&layout, 2, 250);
        write_segment(&layout, 3, 40);

        write_playlist(&layout, "00000.mpls", &[EntrySpec::seconds(3, 120)]);
        write_playlist(&layout, "00001.mpls", &[EntrySpec::seconds(1, 4000)]);
        write_playlist(
            &layout,
            "00002.mpls",
            &[EntrySpec::seconds(1, 2500), EntrySpec::seconds(2, 2500)],
        );
        std::fs::write(layout.playlist_dir.join("00003.mpls"), b"garbage").unwrap();

        let selector = TitleSelector::new(layout, DiscThresholds::default());
        let title = selector.find_main_title().unwrap().unwrap();

        assert_eq!(title.playlist, "00002.mpls");
        assert_eq!(title.title, "The Movie 2010");
        assert_eq!(title.size, 350);
        assert!((title.duration - 5000.0).abs() < 1e-9);
        assert_eq!(title.items[0].filename, "00001.m2ts");
        assert_eq!(title.items[1].filename, "00002.m2ts");
    }

    #[test]
    fn test_find_main_title_equal_durations_uses_lexical_order() {
        let dir = tempfile::tempdir().unwrap();
        let layout = create_disc(dir.path());
        write_segment(&layout, 1, 10);
        write_segment(&layout, 2, 10);

        // written out of order on purpose
        write_playlist(&layout, "00020.mpls", &[EntrySpec::seconds(2, 5000)]);
        write_playlist(&layout, "00010.mpls", &[EntrySpec::seconds(1, 5000)]);

        let selector = TitleSelector::new(layout, DiscThresholds::default());
        let title = selector.find_main_title().unwrap().unwrap();
        assert_eq!(title.playlist, "00010.mpls");
    }

    #[test]
    fn test_find_main_title_none_when_all_short() {
        let dir = tempfile::tempdir().unwrap();
        let layout = create_disc(dir.path());
        write_segment(&layout, 1, 10);
        write_playlist(&layout, "00000.mpls", &[EntrySpec::seconds(1, 1800)]);

        let selector = TitleSelector::new(layout, DiscThresholds::default());
        assert!(selector.find_main_title().unwrap().is_none());
    }

    #[test]
    fn test_thresholds_are_overridable() {
        let dir = tempfile::tempdir().unwrap();
        let layout = create_disc(dir.path());
        write_segment(&layout, 1, 10);
        write_playlist(&layout, "00000.mpls", &[EntrySpec::seconds(1, 1800)]);

        let thresholds = DiscThresholds {
            min_feature_seconds: 1200.0,
            ..DiscThresholds::default()
        };
        let selector = TitleSelector::new(layout, thresholds);
        assert!(selector.find_main_title().unwrap().is_some());
    }

    #[test]
    fn test_relative_disc_root_resolves_absolute_segments() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Rel.Movie");
        let layout = create_disc(&root);
        write_segment(&layout, 1, 10);
        write_playlist(&layout, "00000.mpls", &[EntrySpec::seconds(1, 4000)]);

        // Same disc, reached through a path relative to the working directory.
        let cwd = std::env::current_dir().unwrap();
        let relative: PathBuf = cwd
            .components()
            .skip(1)
            .map(|_| "..")
            .collect::<PathBuf>()
            .join(root.strip_prefix("/").unwrap());
        assert!(relative.is_relative());

        let selector = TitleSelector::new(DiscLayout::new(&relative), DiscThresholds::default());
        let title = selector.find_main_title().unwrap().unwrap();

        assert_eq!(title.title, "Rel Movie");
        assert!(title.items[0].path.is_absolute());
        assert!(title.items[0].path.exists());
    }

    #[test]
    fn test_missing_playlist_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let selector = TitleSelector::new(DiscLayout::new(dir.path()), DiscThresholds::default());
        assert!(selector.find_main_title().is_err());
    }
}
