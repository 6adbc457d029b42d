use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad magic or a truncated header: the playlist file is skipped.
    #[error("Playlist format error: {message}")]
    Format { message: String },

    /// Malformed entry fields inside an otherwise valid playlist.
    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("FFmpeg error: {message}")]
    Ffmpeg { message: String },

    #[error("Media analysis error: {message}")]
    Analysis { message: String },

    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl Error {
    pub fn format<T: Into<String>>(message: T) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub fn decode<T: Into<String>>(message: T) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn ffmpeg<T: Into<String>>(message: T) -> Self {
        Self::Ffmpeg {
            message: message.into(),
        }
    }

    pub fn analysis<T: Into<String>>(message: T) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    pub fn encoding<T: Into<String>>(message: T) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    pub fn parse<T: Into<String>>(message: T) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
