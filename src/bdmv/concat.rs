use super::playlist::PlayItem;
use crate::utils::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const CONCAT_HEADER: &str = "ffconcat version 1.0";

/// Renders play-items as an ffconcat demuxer script.
pub fn build_concat_manifest(items: &[PlayItem]) -> String {
    let mut lines = vec![CONCAT_HEADER.to_string()];

    for item in items {
        lines.push(format!("file '{}'", escape_concat_path(&item.path)));
        if item.in_time > 0 {
            lines.push(format!("inpoint {:.6}", item.in_seconds()));
        }
        lines.push(format!("outpoint {:.6}", item.out_seconds()));
    }

    lines.join("\n")
}

fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('\'', "'\\''")
}

/// Writes the manifest to a uniquely named file in `dir`.
pub fn write_concat_manifest<P: AsRef<Path>>(items: &[PlayItem], dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("bdmv_concat_{}.ffconcat", Uuid::new_v4()));
    std::fs::write(&path, build_concat_manifest(items))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(path: &str, in_time: u32, out_time: u32) -> PlayItem {
        PlayItem {
            filename: Path::new(path)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned(),
            in_time,
            out_time,
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_manifest_layout() {
        let manifest = build_concat_manifest(&[
            item("/disc/BDMV/STREAM/00001.m2ts", 0, 45_000 * 60),
            item("/disc/BDMV/STREAM/00002.m2ts", 22_500, 45_000 * 90),
        ]);

        assert_eq!(
            manifest,
            "ffconcat version 1.0\n\
             file '/disc/BDMV/STREAM/00001.m2ts'\n\
             outpoint 60.000000\n\
             file '/disc/BDMV/STREAM/00002.m2ts'\n\
             inpoint 0.500000\n\
             outpoint 90.000000"
        );
    }

    #[test]
    fn test_manifest_escapes_quotes_and_backslashes() {
        let manifest = build_concat_manifest(&[item(r"C:\rips\Ocean's.Eleven\00001.m2ts", 0, 45_000)]);
        assert!(manifest.contains(r"file 'C:/rips/Ocean'\''s.Eleven/00001.m2ts'"));
    }

    #[test]
    fn test_write_concat_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let items = [item("/disc/BDMV/STREAM/00001.m2ts", 0, 45_000)];
        let path = write_concat_manifest(&items, dir.path()).unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with(CONCAT_HEADER));
    }
}
