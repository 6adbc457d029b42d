use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub video_codec: String,
    pub video_preset: String,
    pub video_crf: u32,
    pub max_threads: u32,
    /// GPU index handed to hardware encoders
    pub gpu_device: u32,
    pub copy_audio: bool,
    pub copy_subtitles: bool,
    pub preferred_languages: Vec<String>,
    pub preserve_hdr: bool,
    pub force_10bit: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx265".to_string(),
            video_preset: "veryslow".to_string(),
            video_crf: 14,
            max_threads: 16,
            gpu_device: 0,
            copy_audio: true,
            copy_subtitles: true,
            preferred_languages: vec!["eng".to_string()],
            preserve_hdr: true,
            force_10bit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_timestamps: bool,
    pub colored_output: bool,
    /// Mirror the log into `encoding.log` in the output directory
    pub write_log_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_timestamps: true,
            colored_output: true,
            write_log_file: true,
        }
    }
}

/// Heuristics used while picking the main title of a disc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscConfig {
    pub min_item_seconds: f64,
    pub min_feature_seconds: f64,
    pub segment_extension: String,
}

impl Default for DiscConfig {
    fn default() -> Self {
        Self {
            min_item_seconds: crate::bdmv::DEFAULT_MIN_ITEM_SECONDS,
            min_feature_seconds: crate::bdmv::DEFAULT_MIN_FEATURE_SECONDS,
            segment_extension: crate::bdmv::DEFAULT_SEGMENT_EXTENSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub update_interval_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 1000,
        }
    }
}
