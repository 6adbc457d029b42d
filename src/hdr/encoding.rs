use super::types::*;
use std::fmt;
use tracing::debug;

/// Dolby Vision profiles x265 can carry through a re-encode.
pub const SUPPORTED_DOLBY_VISION_PROFILES: &[&str] = &["5", "8.1", "8.2", "8.4"];

/// Encoders sharing one set of HDR parameter rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderFamily {
    /// libx265
    Software,
    /// NVENC HEVC
    Hardware,
    /// Anything else; only the colorimetry prefix applies.
    Generic,
}

impl EncoderFamily {
    pub fn from_encoder_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "libx265" | "x265" => Self::Software,
            "hevc_nvenc" | "nvenc" => Self::Hardware,
            _ => Self::Generic,
        }
    }
}

impl fmt::Display for EncoderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Software => "software",
            Self::Hardware => "hardware",
            Self::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Ordered `key=value` tokens. Order is significant to the consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderParameterSet {
    tokens: Vec<String>,
}

impl EncoderParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<K: fmt::Display, V: fmt::Display>(&mut self, key: K, value: V) {
        self.tokens.push(format!("{}={}", key, value));
    }

    /// Replaces the value of an existing key in place, keeping its position.
    pub fn set<V: fmt::Display>(&mut self, key: &str, value: V) {
        let prefix = format!("{}=", key);
        match self.tokens.iter_mut().find(|token| token.starts_with(&prefix)) {
            Some(token) => *token = format!("{}{}", prefix, value),
            None => self.push(key, value),
        }
    }

    /// Splits each token into its key and value.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens
            .iter()
            .map(|token| token.split_once('=').unwrap_or((token.as_str(), "")))
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.tokens.clone()
    }

    pub fn join(&self, separator: &str) -> String {
        self.tokens.join(separator)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

impl fmt::Display for EncoderParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(":"))
    }
}

/// Extension rule for one encoder family. `format: None` matches every
/// HDR format.
pub struct ParameterRule {
    pub family: EncoderFamily,
    pub format: Option<HdrFormat>,
    pub apply: fn(&HdrMetadata, &mut EncoderParameterSet),
}

pub const PARAMETER_RULES: &[ParameterRule] = &[
    ParameterRule {
        family: EncoderFamily::Software,
        format: Some(HdrFormat::Hdr10),
        apply: software_hdr10,
    },
    ParameterRule {
        family: EncoderFamily::Software,
        format: Some(HdrFormat::Hdr10Plus),
        apply: software_hdr10_plus,
    },
    ParameterRule {
        family: EncoderFamily::Software,
        format: Some(HdrFormat::Hlg),
        apply: software_hlg,
    },
    ParameterRule {
        family: EncoderFamily::Software,
        format: Some(HdrFormat::DolbyVision),
        apply: software_dolby_vision,
    },
    ParameterRule {
        family: EncoderFamily::Hardware,
        format: None,
        apply: hardware_hdr,
    },
];

fn software_hdr10(metadata: &HdrMetadata, params: &mut EncoderParameterSet) {
    params.push("hdr10-opt", 1);
    params.push("annexb", 1);
    if let Some(master_display) = &metadata.master_display {
        params.push("master-display", master_display);
    }
    if let Some(max_cll) = &metadata.max_cll {
        params.push("max-cll", max_cll);
    }
}

fn software_hdr10_plus(_: &HdrMetadata, params: &mut EncoderParameterSet) {
    params.push("hdr10-opt", 1);
    params.push("dhdr10-info", "metadata");
    params.push("annexb", 1);
}

fn software_hlg(_: &HdrMetadata, params: &mut EncoderParameterSet) {
    params.set("hdr10", 0);
}

fn software_dolby_vision(metadata: &HdrMetadata, params: &mut EncoderParameterSet) {
    let Some(profile) = metadata
        .dolby_vision_profile
        .as_deref()
        .filter(|profile| SUPPORTED_DOLBY_VISION_PROFILES.contains(profile))
    else {
        debug!(
            "Dolby Vision profile {:?} not supported, skipping DV parameters",
            metadata.dolby_vision_profile
        );
        return;
    };

    params.push("hdr10-opt", 1);
    params.push("annexb", 1);
    params.push("dolby-vision-profile", profile);
    if metadata.rpu_present {
        params.push("dolby-vision-rpu", "metadata");
    }
}

fn hardware_hdr(_: &HdrMetadata, params: &mut EncoderParameterSet) {
    params.push("strict_gop", 1);
    params.push("ref", 6);
    params.push("b_ref_mode", "middle");
    params.push("nonref_p", 1);
}

/// Builds the HDR portion of the encoder options for `family`.
pub fn synthesize(metadata: &HdrMetadata, family: EncoderFamily) -> EncoderParameterSet {
    let mut params = EncoderParameterSet::new();
    if !metadata.is_hdr {
        return params;
    }

    params.push("hdr10", 1);
    params.push("repeat-headers", 1);
    params.push("range", "limited");

    let color = &metadata.color;
    for (key, value) in [
        ("colorprim", &color.color_primaries),
        ("transfer", &color.transfer_characteristics),
        ("colormatrix", &color.color_matrix),
    ] {
        if value != UNKNOWN {
            params.push(key, value);
        }
    }

    for rule in PARAMETER_RULES {
        let format_matches = rule.format.map_or(true, |format| format == metadata.format);
        if rule.family == family && format_matches {
            (rule.apply)(metadata, &mut params);
        }
    }

    debug!("{} HDR parameters for {}: {}", family, metadata.format, params);
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hdr(format: HdrFormat) -> HdrMetadata {
        HdrMetadata {
            color: ColorMetadata {
                color_primaries: "bt2020".to_string(),
                transfer_characteristics: "smpte2084".to_string(),
                color_matrix: "bt2020nc".to_string(),
                bit_depth: 10,
            },
            is_hdr: true,
            format,
            ..HdrMetadata::default()
        }
    }

    #[test]
    fn test_encoder_family_from_name() {
        assert_eq!(EncoderFamily::from_encoder_name("libx265"), EncoderFamily::Software);
        assert_eq!(EncoderFamily::from_encoder_name("X265"), EncoderFamily::Software);
        assert_eq!(EncoderFamily::from_encoder_name("hevc_nvenc"), EncoderFamily::Hardware);
        assert_eq!(EncoderFamily::from_encoder_name("libsvtav1"), EncoderFamily::Generic);
    }

    #[test]
    fn test_sdr_is_passthrough() {
        let meta = HdrMetadata::default();
        assert!(synthesize(&meta, EncoderFamily::Software).is_empty());
        assert!(synthesize(&meta, EncoderFamily::Hardware).is_empty());
    }

    #[test]
    fn test_software_hdr10_full() {
        let mut meta = hdr(HdrFormat::Hdr10);
        meta.master_display =
            Some("G(13250,34500)B(7500,3000)R(34000,16000)WP(15635,16450)L(10000000,50)".into());
        meta.max_cll = Some("1000,400".into());

        assert_eq!(
            synthesize(&meta, EncoderFamily::Software).to_vec(),
            vec![
                "hdr10=1",
                "repeat-headers=1",
                "range=limited",
                "colorprim=bt2020",
                "transfer=smpte2084",
                "colormatrix=bt2020nc",
                "hdr10-opt=1",
                "annexb=1",
                "master-display=G(13250,34500)B(7500,3000)R(34000,16000)WP(15635,16450)L(10000000,50)",
                "max-cll=1000,400",
            ]
        );
    }

    #[test]
    fn test_software_hdr10_without_master_display() {
        let mut meta = hdr(HdrFormat::Hdr10);
        meta.max_cll = Some("1000,400".into());

        let params = synthesize(&meta, EncoderFamily::Software);
        assert!(params.tokens().contains(&"max-cll=1000,400".to_string()));
        assert!(!params.tokens().iter().any(|t| t.starts_with("master-display=")));
    }

    #[test]
    fn test_unknown_colorimetry_is_omitted() {
        let mut meta = hdr(HdrFormat::Hdr10);
        meta.color.color_matrix = UNKNOWN.to_string();

        let params = synthesize(&meta, EncoderFamily::Generic);
        assert_eq!(
            params.join(":"),
            "hdr10=1:repeat-headers=1:range=limited:colorprim=bt2020:transfer=smpte2084"
        );
    }

    #[test]
    fn test_software_hdr10_plus() {
        let params = synthesize(&hdr(HdrFormat::Hdr10Plus), EncoderFamily::Software);
        assert_eq!(
            params.tokens()[6..].to_vec(),
            vec!["hdr10-opt=1", "dhdr10-info=metadata", "annexb=1"]
        );
    }

    #[test]
    fn test_software_hlg_overrides_hdr10_in_place() {
        let mut meta = hdr(HdrFormat::Hlg);
        meta.color.transfer_characteristics = "arib-std-b67".to_string();

        let params = synthesize(&meta, EncoderFamily::Software);
        assert_eq!(params.tokens()[0], "hdr10=0");
        assert_eq!(params.tokens()[1], "repeat-headers=1");
        assert_eq!(params.tokens()[2], "range=limited");
        assert_eq!(params.len(), 6);
    }

    #[test]
    fn test_software_dolby_vision_supported_profile() {
        let mut meta = hdr(HdrFormat::DolbyVision);
        meta.dolby_vision_profile = Some("8.1".into());
        meta.rpu_present = true;

        let params = synthesize(&meta, EncoderFamily::Software);
        assert_eq!(
            params.tokens()[6..].to_vec(),
            vec![
                "hdr10-opt=1",
                "annexb=1",
                "dolby-vision-profile=8.1",
                "dolby-vision-rpu=metadata"
            ]
        );
    }

    #[test]
    fn test_software_dolby_vision_without_rpu() {
        let mut meta = hdr(HdrFormat::DolbyVision);
        meta.dolby_vision_profile = Some("5".into());

        let params = synthesize(&meta, EncoderFamily::Software);
        assert_eq!(params.tokens().last().map(String::as_str), Some("dolby-vision-profile=5"));
    }

    #[test]
    fn test_software_dolby_vision_unsupported_profile() {
        let mut meta = hdr(HdrFormat::DolbyVision);
        meta.dolby_vision_profile = Some("7".into());
        meta.rpu_present = true;

        let params = synthesize(&meta, EncoderFamily::Software);
        assert_eq!(params.len(), 6);
        assert!(!params.tokens().iter().any(|t| t.starts_with("dolby-vision")));
    }

    #[test]
    fn test_hardware_tuning_for_any_hdr() {
        for format in [HdrFormat::Hdr10, HdrFormat::Hlg, HdrFormat::DolbyVision] {
            let params = synthesize(&hdr(format), EncoderFamily::Hardware);
            assert_eq!(
                params.tokens()[6..].to_vec(),
                vec!["strict_gop=1", "ref=6", "b_ref_mode=middle", "nonref_p=1"]
            );
            assert_eq!(params.tokens()[0], "hdr10=1");
        }
    }

    #[test]
    fn test_set_appends_missing_key() {
        let mut params = EncoderParameterSet::new();
        params.push("a", 1);
        params.set("b", 2);
        params.set("a", 3);
        assert_eq!(params.to_string(), "a=3:b=2");
        assert_eq!(params.pairs().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }
}
