use crate::config::EncodingConfig;
use crate::encoding::tracks::TrackSelection;
use crate::hdr::{EncoderFamily, EncoderParameterSet};
use crate::utils::MediaInput;
use std::path::PathBuf;
use tracing::debug;

pub const TEN_BIT_PIXEL_FORMAT: &str = "yuv420p10le";
const NVENC_PRESET: &str = "p7";

/// Tuning applied to every libx265 encode, ahead of any HDR tokens.
fn x265_base_params(config: &EncodingConfig) -> Vec<String> {
    let mut params = vec![
        format!("crf={}", config.video_crf),
        "pools=+,-".to_string(),
        format!("frame-threads={}", config.max_threads),
    ];
    params.extend(
        [
            "rd=4",
            "psy-rd=2.0",
            "psy-rdoq=2.0",
            "aq-mode=3",
            "aq-strength=0.8",
            "deblock=-1,-1",
            "me=star",
            "subme=7",
            "ref=6",
            "rc-lookahead=60",
            "b-adapt=2",
            "bframes=8",
            "keyint=250",
            "min-keyint=23",
            "merange=57",
            "weightp=2",
            "weightb=1",
            "strong-intra-smoothing=0",
        ]
        .map(String::from),
    );

    if config.force_10bit {
        params.extend(["profile=main10", "high-tier=1", "bit-depth=10"].map(String::from));
    }
    params
}

/// Rewrites HDR tokens as ffmpeg options for encoders without a private
/// parameter string. Tokens with no ffmpeg equivalent are dropped.
pub fn hdr_tokens_as_options(params: &EncoderParameterSet) -> Vec<String> {
    let mut args = Vec::new();
    for (key, value) in params.pairs() {
        let (option, value) = match key {
            "colorprim" => ("-color_primaries", value),
            "transfer" => ("-color_trc", value),
            "colormatrix" => ("-colorspace", value),
            "range" => ("-color_range", if value == "full" { "pc" } else { "tv" }),
            "ref" => ("-refs", value),
            "strict_gop" | "b_ref_mode" | "nonref_p" => {
                args.push(format!("-{}", key));
                args.push(value.to_string());
                continue;
            }
            _ => {
                debug!("No ffmpeg option for HDR parameter {}={}", key, value);
                continue;
            }
        };
        args.push(option.to_string());
        args.push(value.to_string());
    }
    args
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodingOptions {
    pub input: MediaInput,
    pub output_path: PathBuf,
    pub title: Option<String>,
    pub tracks: TrackSelection,
    pub hdr_params: EncoderParameterSet,
}

impl EncodingOptions {
    pub fn new<P: Into<PathBuf>>(input: MediaInput, output_path: P) -> Self {
        Self {
            input,
            output_path: output_path.into(),
            title: None,
            tracks: TrackSelection::default(),
            hdr_params: EncoderParameterSet::default(),
        }
    }

    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    pub fn with_tracks(mut self, tracks: TrackSelection) -> Self {
        self.tracks = tracks;
        self
    }

    pub fn with_hdr_params(mut self, hdr_params: EncoderParameterSet) -> Self {
        self.hdr_params = hdr_params;
        self
    }

    /// Full ffmpeg argument list, minus the binary and global flags.
    pub fn to_args(&self, config: &EncodingConfig) -> Vec<String> {
        let mut args = self.input.input_args();

        args.extend(["-map", "0:v:0"].map(String::from));
        for index in self.tracks.audio.iter().chain(&self.tracks.subtitles) {
            args.push("-map".to_string());
            args.push(format!("0:{}", index));
        }

        args.push("-c:v".to_string());
        args.push(config.video_codec.clone());

        match EncoderFamily::from_encoder_name(&config.video_codec) {
            EncoderFamily::Software => {
                args.push("-preset".to_string());
                args.push(config.video_preset.clone());

                let mut x265_params = x265_base_params(config);
                x265_params.extend(self.hdr_params.to_vec());
                args.push("-x265-params".to_string());
                args.push(x265_params.join(":"));
            }
            EncoderFamily::Hardware => {
                args.extend(
                    [
                        "-gpu".to_string(),
                        config.gpu_device.to_string(),
                        "-rc:v".to_string(),
                        "vbr".to_string(),
                        "-cq".to_string(),
                        config.video_crf.to_string(),
                        "-qmin".to_string(),
                        config.video_crf.to_string(),
                        "-qmax".to_string(),
                        (config.video_crf + 2).to_string(),
                        "-profile:v".to_string(),
                        "main10".to_string(),
                        "-preset".to_string(),
                        NVENC_PRESET.to_string(),
                        "-rc-lookahead".to_string(),
                        "32".to_string(),
                        "-spatial_aq".to_string(),
                        "1".to_string(),
                        "-temporal_aq".to_string(),
                        "1".to_string(),
                    ],
                );
                args.extend(hdr_tokens_as_options(&self.hdr_params));
            }
            EncoderFamily::Generic => {
                args.push("-preset".to_string());
                args.push(config.video_preset.clone());
                args.push("-crf".to_string());
                args.push(config.video_crf.to_string());
                args.extend(hdr_tokens_as_options(&self.hdr_params));
            }
        }

        if config.force_10bit {
            args.push("-pix_fmt".to_string());
            args.push(TEN_BIT_PIXEL_FORMAT.to_string());
        }

        args.push("-c:a".to_string());
        args.push(if config.copy_audio { "copy" } else { "aac" }.to_string());
        args.push("-c:s".to_string());
        args.push(if config.copy_subtitles { "copy" } else { "srt" }.to_string());

        if let Some(title) = &self.title {
            args.push("-metadata".to_string());
            args.push(format!("title={}", title));
        }

        args.push(self.output_path.to_string_lossy().into_owned());
        args
    }
}
