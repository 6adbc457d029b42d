pub mod error;
pub mod ffmpeg;
pub mod filesystem;
pub mod logging;
pub mod progress;

pub use error::{Error, Result};
pub use ffmpeg::{parse_progress_line, FfmpegWrapper, MediaInput, ProgressInfo};
pub use filesystem::{discover_sources, format_file_size, Source};
pub use logging::setup_logging;
pub use progress::ProgressMonitor;
