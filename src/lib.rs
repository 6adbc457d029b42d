pub mod analysis;
pub mod bdmv;
pub mod cli;
pub mod config;
pub mod encoding;
pub mod hdr;
pub mod processing;
pub mod utils;

pub use analysis::{MediaInfo, MediaTrack};
pub use bdmv::{PlayItem, Playlist, PlaylistParser, TitleDescriptor, TitleSelector};
pub use config::Config;
pub use encoding::{EncodingOptions, TrackSelection};
pub use hdr::{classify, synthesize, EncoderFamily, EncoderParameterSet, HdrFormat, HdrMetadata};
pub use processing::BatchProcessor;
pub use utils::{Error, FfmpegWrapper, Result};
