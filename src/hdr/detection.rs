use super::metadata::HdrMetadataExtractor;
use super::probe::ProbeMetadata;
use super::types::*;
use serde_json::Value;
use tracing::debug;

const TRANSFER_KEYS: &[&str] = &["color_transfer", "transfer_characteristics", "color_trc"];
const PRIMARIES_KEYS: &[&str] = &["color_primaries", "primaries"];
const MATRIX_KEYS: &[&str] = &["color_space", "color_matrix", "matrix_coefficients"];
const BIT_DEPTH_KEYS: &[&str] = &["bits_per_raw_sample", "bit_depth", "bits_per_sample"];

const DOLBY_VISION_TAG_PREFIX: &str = "dovi";
const DOLBY_VISION_PROFILE_TAG: &str = "dv_profile";
const DOLBY_VISION_RPU_MARKERS: &[&str] = &["dv_rpu"];
const HDR10_PLUS_MARKERS: &[&str] = &["dhdr", "smpte2094-40", "smpte 2094-40", "hdr10+"];

const PQ_TRANSFER: &str = "smpte2084";
const HLG_TRANSFER: &str = "arib-std-b67";
const BT2020_PRIMARIES: &str = "bt2020";

const CONTENT_LIGHT_LEVEL_KIND: &str = "content light level";
const MASTERING_DISPLAY_KIND: &str = "mastering display";

/// One row of the format priority table.
pub struct FormatRule {
    pub format: HdrFormat,
    pub matches: fn(&ProbeMetadata, &ColorMetadata) -> bool,
}

/// Checked top to bottom; the first match wins.
pub const FORMAT_RULES: &[FormatRule] = &[
    FormatRule {
        format: HdrFormat::DolbyVision,
        matches: is_dolby_vision,
    },
    FormatRule {
        format: HdrFormat::Hdr10Plus,
        matches: has_dynamic_metadata,
    },
    FormatRule {
        format: HdrFormat::Hdr10,
        matches: is_pq_bt2020,
    },
    FormatRule {
        format: HdrFormat::Hlg,
        matches: is_hlg,
    },
];

fn is_dolby_vision(probe: &ProbeMetadata, _: &ColorMetadata) -> bool {
    probe
        .tag_values()
        .any(|value| value.trim().to_lowercase().starts_with(DOLBY_VISION_TAG_PREFIX))
}

fn has_dynamic_metadata(probe: &ProbeMetadata, _: &ColorMetadata) -> bool {
    probe.any_side_data_marker(HDR10_PLUS_MARKERS)
}

fn is_pq_bt2020(_: &ProbeMetadata, color: &ColorMetadata) -> bool {
    color.transfer_characteristics == PQ_TRANSFER && color.color_primaries == BT2020_PRIMARIES
}

fn is_hlg(_: &ProbeMetadata, color: &ColorMetadata) -> bool {
    color.transfer_characteristics == HLG_TRANSFER
}

/// Classifies a probed video stream, optionally overlaid with its first
/// decoded frame. Never fails: malformed input degrades to defaults.
pub fn classify(stream: &Value, frame: Option<&Value>) -> HdrMetadata {
    classify_probe(&ProbeMetadata::from_json(stream, frame))
}

pub fn classify_probe(probe: &ProbeMetadata) -> HdrMetadata {
    let color = color_metadata(probe);
    let format = detect_format(probe, &color);

    let mut metadata = HdrMetadata::sdr(color);
    metadata.format = format;
    metadata.is_hdr = format != HdrFormat::None;

    if format == HdrFormat::DolbyVision {
        metadata.dolby_vision_profile = probe
            .tag_containing(DOLBY_VISION_PROFILE_TAG)
            .map(|profile| profile.trim().to_string());
        metadata.rpu_present = probe.any_side_data_marker(DOLBY_VISION_RPU_MARKERS);
    }

    apply_light_levels(probe, &mut metadata);

    debug!("HDR classification: {}", metadata.summary());
    metadata
}

pub fn detect_format(probe: &ProbeMetadata, color: &ColorMetadata) -> HdrFormat {
    FORMAT_RULES
        .iter()
        .find(|rule| (rule.matches)(probe, color))
        .map(|rule| rule.format)
        .unwrap_or(HdrFormat::None)
}

pub fn color_metadata(probe: &ProbeMetadata) -> ColorMetadata {
    let lookup = |keys: &[&str]| -> String {
        probe
            .property(keys)
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string())
    };

    let bit_depth = probe
        .property(BIT_DEPTH_KEYS)
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|depth| *depth > 0)
        .unwrap_or(DEFAULT_BIT_DEPTH);

    ColorMetadata {
        color_primaries: lookup(PRIMARIES_KEYS),
        transfer_characteristics: lookup(TRANSFER_KEYS),
        color_matrix: lookup(MATRIX_KEYS),
        bit_depth,
    }
}

fn apply_light_levels(probe: &ProbeMetadata, metadata: &mut HdrMetadata) {
    for entry in &probe.side_data {
        if entry.kind_matches(CONTENT_LIGHT_LEVEL_KIND) {
            metadata.max_cll = Some(HdrMetadataExtractor::format_max_cll(
                entry.field("max_content"),
                entry.field("max_average"),
            ));
        } else if entry.kind_matches(MASTERING_DISPLAY_KIND) {
            let luminance = |key: &str| {
                entry
                    .field(key)
                    .map(HdrMetadataExtractor::parse_luminance)
                    .unwrap_or(0.0)
            };
            metadata.max_luminance = Some(luminance("max_luminance"));
            metadata.min_luminance = Some(luminance("min_luminance"));

            let raw = entry
                .field("master_display_primaries")
                .map(str::to_string)
                .or_else(|| HdrMetadataExtractor::master_display_from_components(entry));
            metadata.master_display =
                raw.and_then(|raw| HdrMetadataExtractor::format_master_display(&raw));
        }
    }
}
