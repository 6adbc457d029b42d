pub mod media;

pub use media::{MediaInfo, MediaTrack, TrackKind, UNDETERMINED_LANGUAGE};
