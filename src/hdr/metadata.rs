use super::probe::SideDataEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

static PRIMARY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([RGB])\((\d+),(\d+)\)").expect("valid primary regex"));

static WHITE_POINT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"WP\((\d+),(\d+)\)").expect("valid white point regex"));

static LUMINANCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"L\((\d+),(\d+)\)").expect("valid luminance regex"));

/// x265 expects chromaticity in 0.00002 steps and luminance in 0.0001 cd/m².
const CHROMATICITY_SCALE: f64 = 50_000.0;
const LUMINANCE_SCALE: f64 = 10_000.0;

/// Emission order of the colour primaries in the descriptor.
const PRIMARY_ORDER: [char; 3] = ['G', 'B', 'R'];

pub struct HdrMetadataExtractor;

impl HdrMetadataExtractor {
    /// Parses a luminance value that may be a fraction ("50/10000") or a
    /// plain number. Anything unparseable is 0.0.
    pub fn parse_luminance(raw: &str) -> f64 {
        let raw = raw.trim();
        let value = match raw.split_once('/') {
            Some((numerator, denominator)) => {
                match (
                    numerator.trim().parse::<f64>(),
                    denominator.trim().parse::<f64>(),
                ) {
                    (Ok(n), Ok(d)) if d != 0.0 => n / d,
                    _ => 0.0,
                }
            }
            None => raw.parse::<f64>().unwrap_or(0.0),
        };

        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    /// Rewrites a raw mastering display string into the canonical
    /// `G(x,y)B(x,y)R(x,y)WP(x,y)L(max,min)` form.
    ///
    /// Needs exactly one pair per colour channel plus a white point and a
    /// luminance pair; anything else gives `None`.
    pub fn format_master_display(raw: &str) -> Option<String> {
        let mut primaries: BTreeMap<char, (&str, &str)> = BTreeMap::new();
        for captures in PRIMARY_REGEX.captures_iter(raw) {
            let channel = captures.get(1)?.as_str().chars().next()?;
            let pair = (captures.get(2)?.as_str(), captures.get(3)?.as_str());
            if primaries.insert(channel, pair).is_some() {
                debug!("Mastering display lists channel {} twice", channel);
                return None;
            }
        }

        let white_point = WHITE_POINT_REGEX.captures(raw)?;
        let luminance = LUMINANCE_REGEX.captures(raw)?;

        let mut descriptor = String::new();
        for channel in PRIMARY_ORDER {
            let (x, y) = primaries.get(&channel)?;
            descriptor.push_str(&format!("{}({},{})", channel, x, y));
        }
        descriptor.push_str(&format!(
            "WP({},{})L({},{})",
            white_point.get(1)?.as_str(),
            white_point.get(2)?.as_str(),
            luminance.get(1)?.as_str(),
            luminance.get(2)?.as_str()
        ));

        Some(descriptor)
    }

    /// Builds the raw primaries string from per-component side data
    /// (`red_x: "34000/50000"`, `max_luminance: "10000000/10000"`, ...).
    pub fn master_display_from_components(entry: &SideDataEntry) -> Option<String> {
        let chroma = |key: &str| -> Option<u64> {
            entry
                .field(key)
                .map(|v| (Self::parse_luminance(v) * CHROMATICITY_SCALE).round() as u64)
        };
        let luminance = |key: &str| -> Option<u64> {
            entry
                .field(key)
                .map(|v| (Self::parse_luminance(v) * LUMINANCE_SCALE).round() as u64)
        };

        Some(format!(
            "R({},{})G({},{})B({},{})WP({},{})L({},{})",
            chroma("red_x")?,
            chroma("red_y")?,
            chroma("green_x")?,
            chroma("green_y")?,
            chroma("blue_x")?,
            chroma("blue_y")?,
            chroma("white_point_x")?,
            chroma("white_point_y")?,
            luminance("max_luminance")?,
            luminance("min_luminance")?
        ))
    }

    /// "max_content,max_average" with each part an integer, 0 when absent
    /// or invalid.
    pub fn format_max_cll(max_content: Option<&str>, max_average: Option<&str>) -> String {
        let level = |raw: Option<&str>| -> u64 {
            raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0)
        };
        format!("{},{}", level(max_content), level(max_average))
    }
}
