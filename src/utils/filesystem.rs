use crate::bdmv::DiscLayout;
use crate::utils::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4"];

/// One unit of work for the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Root of a ripped disc (has `BDMV/PLAYLIST`)
    Disc(PathBuf),
    /// Standalone container file
    File(PathBuf),
}

impl Source {
    pub fn path(&self) -> &Path {
        match self {
            Self::Disc(path) | Self::File(path) => path,
        }
    }

    pub fn name(&self) -> String {
        let path = self.path();
        let name = match self {
            Self::Disc(_) => path.file_name(),
            Self::File(_) => path.file_stem(),
        };
        name.map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

/// Collects disc roots and loose video files under `path`, in lexical
/// order. Disc trees are not descended into.
pub fn discover_sources<P: AsRef<Path>>(path: P) -> Result<Vec<Source>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::validation(format!(
            "Path does not exist: {}",
            path.display()
        )));
    }

    if path.is_file() {
        if is_video_file(path) {
            return Ok(vec![Source::File(path.to_path_buf())]);
        }
        return Err(Error::validation(format!(
            "File is not a supported video format: {}",
            path.display()
        )));
    }

    let mut sources = Vec::new();
    let mut walker = WalkDir::new(path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let entry_path = entry.path();

        if entry.file_type().is_dir() {
            if DiscLayout::is_disc_root(entry_path) {
                sources.push(Source::Disc(entry_path.to_path_buf()));
                walker.skip_current_dir();
            }
        } else if entry.file_type().is_file() && is_video_file(entry_path) {
            sources.push(Source::File(entry_path.to_path_buf()));
        }
    }

    if sources.is_empty() {
        return Err(Error::validation(format!(
            "No discs or video files found in: {}",
            path.display()
        )));
    }

    Ok(sources)
}

pub fn is_video_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Largest file with `extension` in `dir`, used when no playlist
/// qualifies as the main title.
pub fn largest_file_with_extension<P: AsRef<Path>>(
    dir: P,
    extension: &str,
) -> Result<Option<PathBuf>> {
    let mut largest: Option<(u64, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !matches || !path.is_file() {
            continue;
        }

        let size = get_file_size(&path)?;
        let bigger = match &largest {
            Some((best, best_path)) => size > *best || (size == *best && path < *best_path),
            None => true,
        };
        if bigger {
            largest = Some((size, path));
        }
    }

    Ok(largest.map(|(_, path)| path))
}

pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn get_file_size<P: AsRef<Path>>(path: P) -> Result<u64> {
    let metadata = std::fs::metadata(path)?;
    Ok(metadata.len())
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let size = bytes as f64;
    let unit_index = (size.log(THRESHOLD) as usize).min(UNITS.len() - 1);
    let size_in_unit = size / THRESHOLD.powi(unit_index as i32);

    format!("{:.2} {}", size_in_unit, UNITS[unit_index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file("test.mkv"));
        assert!(is_video_file("test.MP4"));
        assert!(!is_video_file("test.m2ts"));
        assert!(!is_video_file("test"));
    }

    #[test]
    fn test_discover_sources_mixed_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b.disc").join("BDMV").join("PLAYLIST")).unwrap();
        fs::create_dir_all(root.join("b.disc").join("BDMV").join("STREAM")).unwrap();
        fs::write(root.join("b.disc").join("extra.mkv"), b"x").unwrap();
        fs::write(root.join("a.mkv"), b"x").unwrap();
        fs::write(root.join("c.mp4"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();

        let sources = discover_sources(root).unwrap();
        assert_eq!(
            sources,
            vec![
                Source::File(root.join("a.mkv")),
                Source::Disc(root.join("b.disc")),
                Source::File(root.join("c.mp4")),
            ]
        );
    }

    #[test]
    fn test_discover_sources_disc_root_itself() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("BDMV").join("PLAYLIST")).unwrap();
        let sources = discover_sources(dir.path()).unwrap();
        assert_eq!(sources, vec![Source::Disc(dir.path().to_path_buf())]);
    }

    #[test]
    fn test_discover_sources_empty_is_error() {
        let dir = tempdir().unwrap();
        assert!(discover_sources(dir.path()).is_err());
        assert!(discover_sources(dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_source_name() {
        assert_eq!(Source::Disc(PathBuf::from("/rips/Movie.2001")).name(), "Movie.2001");
        assert_eq!(Source::File(PathBuf::from("/rips/clip.mkv")).name(), "clip");
    }

    #[test]
    fn test_largest_file_with_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("00001.m2ts"), vec![0u8; 10]).unwrap();
        fs::write(dir.path().join("00002.m2ts"), vec![0u8; 30]).unwrap();
        fs::write(dir.path().join("00003.clpi"), vec![0u8; 50]).unwrap();

        assert_eq!(
            largest_file_with_extension(dir.path(), "m2ts").unwrap(),
            Some(dir.path().join("00002.m2ts"))
        );
        assert_eq!(largest_file_with_extension(dir.path(), "mkv").unwrap(), None);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1_073_741_824), "1.00 GB");
    }
}
