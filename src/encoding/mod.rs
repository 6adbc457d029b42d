pub mod options;
pub mod tracks;

pub use options::{hdr_tokens_as_options, EncodingOptions};
pub use tracks::{is_foreign, select_tracks, TrackSelection};
