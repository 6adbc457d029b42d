use crate::config::ToolsConfig;
use crate::utils::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command as TokioCommand};
use tracing::debug;

static TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"time=\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").unwrap());

static FRAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"frame=\s*(\d+)").unwrap());

static FPS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"fps=\s*([0-9.]+)").unwrap());

static SPEED_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"speed=\s*([0-9.]+)x").unwrap());

/// What ffmpeg/ffprobe read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaInput {
    File(PathBuf),
    /// ffconcat manifest listing disc segments
    Concat(PathBuf),
}

impl MediaInput {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) | Self::Concat(path) => path,
        }
    }

    pub fn input_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Self::Concat(_) = self {
            args.extend(["-f", "concat", "-safe", "0"].map(String::from));
        }
        args.push("-i".to_string());
        args.push(self.path().to_string_lossy().into_owned());
        args
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressInfo {
    pub frame: Option<u64>,
    pub fps: Option<f32>,
    /// Output position in seconds
    pub time: f64,
    pub speed: Option<f32>,
}

impl ProgressInfo {
    pub fn percentage(&self, total_duration: f64) -> f64 {
        if total_duration > 0.0 {
            (self.time / total_duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Parses an ffmpeg stderr status line (`frame=... time=... speed=...`).
pub fn parse_progress_line(line: &str) -> Option<ProgressInfo> {
    if !line.contains("frame=") && !line.contains("time=") {
        return None;
    }

    let mut progress = ProgressInfo::default();

    if let Some(captures) = FRAME_REGEX.captures(line) {
        progress.frame = captures[1].parse().ok();
    }
    if let Some(captures) = TIME_REGEX.captures(line) {
        let hours: f64 = captures[1].parse().ok()?;
        let minutes: f64 = captures[2].parse().ok()?;
        let seconds: f64 = captures[3].parse().ok()?;
        progress.time = hours * 3600.0 + minutes * 60.0 + seconds;
    }
    if let Some(captures) = FPS_REGEX.captures(line) {
        progress.fps = captures[1].parse().ok();
    }
    if let Some(captures) = SPEED_REGEX.captures(line) {
        progress.speed = captures[1].parse().ok();
    }

    if progress.frame.is_some() || progress.time > 0.0 {
        Some(progress)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegWrapper {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegWrapper {
    pub fn new(ffmpeg_path: String, ffprobe_path: String) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
        }
    }

    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::new(tools.ffmpeg.clone(), tools.ffprobe.clone())
    }

    pub async fn check_availability(&self) -> Result<()> {
        for (name, path) in [("FFmpeg", &self.ffmpeg_path), ("FFprobe", &self.ffprobe_path)] {
            let status = TokioCommand::new(path)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            match status {
                Ok(status) if status.success() => {}
                _ => {
                    return Err(Error::ffmpeg(format!(
                        "{} is not available or not executable ({})",
                        name, path
                    )))
                }
            }
        }
        Ok(())
    }

    /// Container, stream and first-frame information as JSON.
    pub async fn probe(&self, input: &MediaInput) -> Result<Value> {
        let mut args: Vec<String> = ["-v", "quiet", "-print_format", "json"]
            .map(String::from)
            .to_vec();
        args.extend(
            [
                "-show_format",
                "-show_streams",
                "-show_frames",
                "-read_intervals",
                "%+#1",
            ]
            .map(String::from),
        );
        args.extend(input.input_args());

        debug!("Running ffprobe with args: {:?}", args);
        let output = TokioCommand::new(&self.ffprobe_path)
            .args(&args)
            .output()
            .await?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ffmpeg(format!("ffprobe failed: {}", error_msg.trim())));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::parse(format!("Failed to parse ffprobe output: {}", e)))
    }

    /// Spawns ffmpeg with stderr piped for progress parsing.
    pub fn start_encoding(&self, args: &[String]) -> Result<Child> {
        debug!("Running ffmpeg with args: {:?}", args);
        let child = TokioCommand::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-y"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        Ok(child)
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }
}
