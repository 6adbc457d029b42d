use crate::hdr::{self, HdrMetadata};
use crate::utils::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const UNDETERMINED_LANGUAGE: &str = "und";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Subtitle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaTrack {
    /// Absolute stream index inside the input
    pub index: usize,
    pub kind: TrackKind,
    pub language: String,
    pub codec: String,
    pub title: Option<String>,
}

/// Everything the encoder needs to know about one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub duration: f64,
    pub video_codec: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub audio_tracks: Vec<MediaTrack>,
    pub subtitle_tracks: Vec<MediaTrack>,
    pub hdr: HdrMetadata,
}

impl MediaInfo {
    /// Builds the media description from ffprobe JSON
    /// (`-show_format -show_streams -show_frames`).
    pub fn from_probe<P: AsRef<Path>>(path: P, probe: &Value) -> Result<Self> {
        let streams = probe["streams"]
            .as_array()
            .ok_or_else(|| Error::analysis("No streams found in ffprobe output"))?;

        let (video_position, video_stream) = streams
            .iter()
            .enumerate()
            .find(|(_, stream)| stream["codec_type"].as_str() == Some("video"))
            .ok_or_else(|| Error::analysis("No video stream found"))?;
        let video_index = stream_index(video_stream, video_position);

        let frame = probe["frames"].as_array().and_then(|frames| {
            frames
                .iter()
                .find(|frame| frame["stream_index"].as_u64() == Some(video_index as u64))
                .or_else(|| frames.first())
        });

        let hdr = hdr::classify(video_stream, frame);

        let mut audio_tracks = Vec::new();
        let mut subtitle_tracks = Vec::new();
        for (position, stream) in streams.iter().enumerate() {
            let kind = match stream["codec_type"].as_str() {
                Some("audio") => TrackKind::Audio,
                Some("subtitle") => TrackKind::Subtitle,
                _ => continue,
            };
            let track = MediaTrack {
                index: stream_index(stream, position),
                kind,
                language: tag(stream, "language")
                    .unwrap_or_else(|| UNDETERMINED_LANGUAGE.to_string()),
                codec: stream["codec_name"].as_str().unwrap_or("unknown").to_string(),
                title: tag(stream, "title"),
            };
            match kind {
                TrackKind::Audio => audio_tracks.push(track),
                TrackKind::Subtitle => subtitle_tracks.push(track),
            }
        }

        let duration = seconds(&probe["format"]["duration"])
            .or_else(|| seconds(&video_stream["duration"]))
            .unwrap_or(0.0);

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            duration,
            video_codec: video_stream["codec_name"]
                .as_str()
                .unwrap_or("unknown")
                .to_string(),
            width: video_stream["width"].as_u64().map(|w| w as u32),
            height: video_stream["height"].as_u64().map(|h| h as u32),
            audio_tracks,
            subtitle_tracks,
            hdr,
        })
    }
}

fn stream_index(stream: &Value, position: usize) -> usize {
    stream["index"]
        .as_u64()
        .map(|index| index as usize)
        .unwrap_or(position)
}

fn tag(stream: &Value, key: &str) -> Option<String> {
    stream["tags"][key]
        .as_str()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn seconds(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
