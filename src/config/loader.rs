use super::types::*;
use crate::utils::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_FILE_NAME: &str = "config.yaml";
const CONFIG_DIR_NAME: &str = "bdmv-encoder";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub encoding: EncodingConfig,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
    pub disc: DiscConfig,
    pub progress: ProgressConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)?;
        let config: Config = serde_yaml::from_str(&config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the first config found among `explicit`, `./config.yaml` and
    /// the per-user config directory. Falls back to built-in defaults.
    ///
    /// An explicit path that does not exist yet is created with the
    /// defaults.
    pub fn load_with_fallback(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                let config = Self::default();
                config.save(path)?;
                info!("Created default configuration at {}", path.display());
                return Ok(config);
            }
            return Self::load(path);
        }

        for candidate in Self::search_paths() {
            if candidate.is_file() {
                debug!("Loading config from {}", candidate.display());
                return Self::load(&candidate);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(user_dir) = Self::user_config_path() {
            paths.push(user_dir);
        }
        paths
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn save<P: AsRef<Path>>(&self, config_path: P) -> Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.encoding.video_codec.trim().is_empty() {
            return Err(Error::validation("video_codec must not be empty"));
        }

        if self.encoding.video_crf > 51 {
            return Err(Error::validation(format!(
                "Invalid video_crf: {} (must be between 0 and 51)",
                self.encoding.video_crf
            )));
        }

        if self.progress.update_interval_ms == 0 {
            return Err(Error::validation(
                "update_interval_ms must be greater than 0",
            ));
        }

        let disc = &self.disc;
        if !(disc.min_item_seconds >= 0.0) || !(disc.min_feature_seconds >= 0.0) {
            return Err(Error::validation(
                "disc thresholds must be non-negative numbers",
            ));
        }

        if disc.segment_extension.trim().is_empty() {
            return Err(Error::validation("segment_extension must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        match config.validate() {
            Ok(()) => {}
            Err(e) => panic!("Config validation failed: {}", e),
        }

        config.progress.update_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.encoding.video_crf = 52;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.disc.min_feature_seconds = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.disc.min_item_seconds = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.encoding.video_codec, "libx265");
        assert_eq!(config.encoding.video_crf, 14);
        assert_eq!(config.encoding.preferred_languages, vec!["eng"]);
        assert_eq!(config.disc.min_item_seconds, 30.0);
        assert_eq!(config.disc.min_feature_seconds, 3600.0);
        assert_eq!(config.disc.segment_extension, "m2ts");
    }

    #[test]
    fn test_config_load_partial_yaml() {
        let yaml = r#"
encoding:
  video_codec: "hevc_nvenc"
  video_crf: 18
  preferred_languages: ["eng", "ger"]

logging:
  level: "debug"
  show_timestamps: false

disc:
  min_feature_seconds: 1800
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.encoding.video_codec, "hevc_nvenc");
        assert_eq!(config.encoding.video_crf, 18);
        assert_eq!(config.encoding.video_preset, "veryslow");
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.show_timestamps);
        assert!(config.logging.colored_output);
        assert_eq!(config.disc.min_feature_seconds, 1800.0);
        assert_eq!(config.disc.min_item_seconds, 30.0);
        assert_eq!(config.progress.update_interval_ms, 1000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.encoding.copy_audio = false;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "encoding:\n  video_crf: 99\n").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_missing_explicit_path_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nested").join("config.yaml");

        let config = Config::load_with_fallback(Some(&missing)).unwrap();
        assert_eq!(config, Config::default());
        assert!(missing.is_file());
        assert_eq!(Config::load(&missing).unwrap(), Config::default());
    }

    #[test]
    fn test_existing_explicit_path_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "encoding:\n  video_crf: 18\n").unwrap();

        let config = Config::load_with_fallback(Some(&path)).unwrap();
        assert_eq!(config.encoding.video_crf, 18);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "encoding:\n  video_crf: 18\n");
    }
}
