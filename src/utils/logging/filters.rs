//! Drops encoder chatter that would drown out the pipeline's own messages.

const NOISE_PATTERNS: &[&str] = &[
    "Invalid Block Addition value",
    "Could not find codec parameters for stream",
    "Consider increasing the value for the 'analyzeduration'",
    "x265 [info]: HEVC encoder version",
    "x265 [info]: build info",
    "x265 [info]: using cpu capabilities",
    "x265 [info]: Thread pool created",
    "x265 [info]: frame threads",
    "x265 [info]: Coding QT",
    "x265 [info]: Residual QT",
    "x265 [info]: ME / range",
    "x265 [info]: Keyframe min",
    "x265 [info]: Lookahead",
    "x265 [info]: b-pyramid",
    "x265 [info]: References",
    "x265 [info]: AQ:",
    "x265 [info]: Rate Control",
    "x265 [info]: tools:",
    "Last message repeated",
    "PES packet size mismatch",
    "Packet corrupt",
];

pub fn is_noise(message: &str) -> bool {
    NOISE_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

/// True for ffmpeg stderr lines reporting a failure.
pub fn is_error_line(line: &str) -> bool {
    !is_noise(line) && (line.contains("Error") || line.contains("error"))
}
