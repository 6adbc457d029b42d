use serde::{Deserialize, Serialize};
use std::fmt;

pub const UNKNOWN: &str = "unknown";
pub const DEFAULT_BIT_DEPTH: u32 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HdrFormat {
    #[default]
    #[serde(rename = "none")]
    None, // SDR content
    #[serde(rename = "hdr10")]
    Hdr10, // Static HDR with SMPTE-2084 PQ
    #[serde(rename = "hdr10plus")]
    Hdr10Plus, // Dynamic HDR with ST 2094-40 metadata
    #[serde(rename = "hlg")]
    Hlg, // Hybrid Log-Gamma (broadcast HDR)
    #[serde(rename = "dolby_vision")]
    DolbyVision,
}

impl HdrFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Hdr10 => "hdr10",
            Self::Hdr10Plus => "hdr10plus",
            Self::Hlg => "hlg",
            Self::DolbyVision => "dolby_vision",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "SDR",
            Self::Hdr10 => "HDR10",
            Self::Hdr10Plus => "HDR10+",
            Self::Hlg => "HLG",
            Self::DolbyVision => "Dolby Vision",
        }
    }
}

impl fmt::Display for HdrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical colorimetry of a video stream. Strings are lower-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMetadata {
    pub color_primaries: String,
    pub transfer_characteristics: String,
    pub color_matrix: String,
    pub bit_depth: u32,
}

impl Default for ColorMetadata {
    fn default() -> Self {
        Self {
            color_primaries: UNKNOWN.to_string(),
            transfer_characteristics: UNKNOWN.to_string(),
            color_matrix: UNKNOWN.to_string(),
            bit_depth: DEFAULT_BIT_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HdrMetadata {
    #[serde(flatten)]
    pub color: ColorMetadata,
    pub is_hdr: bool,
    pub format: HdrFormat,
    /// "max_content,max_average"
    pub max_cll: Option<String>,
    /// Canonical `G(x,y)B(x,y)R(x,y)WP(x,y)L(max,min)` descriptor
    pub master_display: Option<String>,
    pub max_luminance: Option<f64>,
    pub min_luminance: Option<f64>,
    pub dolby_vision_profile: Option<String>,
    pub rpu_present: bool,
}

impl HdrMetadata {
    pub fn sdr(color: ColorMetadata) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} [{}/{}/{}, {}-bit]",
            self.format.display_name(),
            self.color.color_primaries,
            self.color.transfer_characteristics,
            self.color.color_matrix,
            self.color.bit_depth
        );

        if let (Some(max), Some(min)) = (self.max_luminance, self.min_luminance) {
            summary.push_str(&format!(" | L({}-{:.4})", max, min));
        }
        if let Some(cll) = &self.max_cll {
            summary.push_str(&format!(" | CLL: {}", cll));
        }
        if let Some(profile) = &self.dolby_vision_profile {
            summary.push_str(&format!(" | DV profile {}", profile));
            if self.rpu_present {
                summary.push_str(" (RPU)");
            }
        }
        summary
    }
}
