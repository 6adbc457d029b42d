//! Canonical form of the loosely structured probe output.
//!
//! Probers report tags either as a mapping or as a list of key/value
//! records, numbers either as JSON numbers or strings, and spread HDR side
//! data over the stream and its first frame. [`ProbeMetadata`] flattens all
//! of that into one shape before any classification happens.

use serde_json::Value;
use std::collections::BTreeMap;

/// One side-data record, e.g. "Mastering display metadata".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideDataEntry {
    pub kind: String,
    pub fields: BTreeMap<String, String>,
    /// Lower-cased text of the whole record, used for marker lookups.
    raw: String,
}

impl SideDataEntry {
    pub fn new<S: Into<String>>(kind: S, fields: BTreeMap<String, String>) -> Self {
        let kind = kind.into();
        let mut raw = kind.to_lowercase();
        for (key, value) in &fields {
            raw.push(' ');
            raw.push_str(&key.to_lowercase());
            raw.push('=');
            raw.push_str(&value.to_lowercase());
        }
        Self { kind, fields, raw }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let kind = map
                    .get("side_data_type")
                    .and_then(scalar_to_string)
                    .unwrap_or_default();
                let fields = map
                    .iter()
                    .filter(|(key, _)| key.as_str() != "side_data_type")
                    .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key.clone(), v)))
                    .collect();
                let mut entry = Self::new(kind, fields);
                // nested payloads still count for marker lookups
                entry.raw = value.to_string().to_lowercase();
                Some(entry)
            }
            other => scalar_to_string(other).map(|kind| Self::new(kind, BTreeMap::new())),
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn kind_matches(&self, needle: &str) -> bool {
        self.kind.to_lowercase().contains(needle)
    }

    /// Case-insensitive substring search over the whole record.
    pub fn contains_marker(&self, marker: &str) -> bool {
        self.raw.contains(&marker.to_lowercase())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeMetadata {
    pub properties: BTreeMap<String, String>,
    /// (key, value) pairs; list-style tags without a key get an empty key.
    pub tags: Vec<(String, String)>,
    pub side_data: Vec<SideDataEntry>,
}

impl ProbeMetadata {
    /// Builds the canonical bag from a stream object and an optional frame
    /// object. Non-empty frame properties replace the stream's.
    pub fn from_json(stream: &Value, frame: Option<&Value>) -> Self {
        let mut metadata = Self::default();
        metadata.absorb(stream);
        if let Some(frame) = frame {
            metadata.absorb(frame);
        }
        metadata
    }

    fn absorb(&mut self, source: &Value) {
        let Some(map) = source.as_object() else {
            return;
        };

        for (key, value) in map {
            match key.as_str() {
                "tags" => self.tags.extend(normalize_tags(value)),
                "side_data_list" => {
                    if let Some(entries) = value.as_array() {
                        self.side_data
                            .extend(entries.iter().filter_map(SideDataEntry::from_json));
                    }
                }
                _ => {
                    if let Some(text) = scalar_to_string(value).filter(|t| !t.is_empty()) {
                        self.properties.insert(key.clone(), text);
                    }
                }
            }
        }
    }

    /// First present value among `keys`, in order.
    pub fn property(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.properties.get(*key))
            .map(String::as_str)
    }

    pub fn tag_values(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|(_, value)| value.as_str())
    }

    /// Value of the first tag whose key contains `needle`.
    pub fn tag_containing(&self, needle: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(key, _)| key.to_lowercase().contains(needle))
            .map(|(_, value)| value.as_str())
    }

    pub fn any_side_data_marker(&self, markers: &[&str]) -> bool {
        self.side_data
            .iter()
            .any(|entry| markers.iter().any(|marker| entry.contains_marker(marker)))
    }
}

fn normalize_tags(value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key.clone(), v)))
            .collect(),
        Value::Array(entries) => entries.iter().flat_map(normalize_tag_record).collect(),
        other => scalar_to_string(other)
            .map(|v| vec![(String::new(), v)])
            .unwrap_or_default(),
    }
}

fn normalize_tag_record(record: &Value) -> Vec<(String, String)> {
    match record {
        Value::Object(map) if map.contains_key("key") || map.contains_key("value") => {
            let key = map.get("key").and_then(scalar_to_string).unwrap_or_default();
            let value = map.get("value").and_then(scalar_to_string).unwrap_or_default();
            vec![(key, value)]
        }
        Value::Object(_) => normalize_tags(record),
        other => scalar_to_string(other)
            .map(|v| vec![(String::new(), v)])
            .unwrap_or_default(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mapping_and_list_tags_normalize_alike() {
        let mapped = ProbeMetadata::from_json(&json!({"tags": {"language": "eng"}}), None);
        let listed = ProbeMetadata::from_json(
            &json!({"tags": [{"key": "language", "value": "eng"}]}),
            None,
        );
        assert_eq!(mapped.tags, listed.tags);
    }

    #[test]
    fn test_bare_string_tags_have_empty_key() {
        let metadata = ProbeMetadata::from_json(&json!({"tags": ["dovi_p8"]}), None);
        assert_eq!(metadata.tags, vec![(String::new(), "dovi_p8".to_string())]);
    }

    #[test]
    fn test_numbers_become_strings() {
        let metadata = ProbeMetadata::from_json(&json!({"bits_per_raw_sample": 10}), None);
        assert_eq!(metadata.property(&["bits_per_raw_sample"]), Some("10"));
    }

    #[test]
    fn test_property_fallback_order() {
        let metadata = ProbeMetadata::from_json(
            &json!({"transfer_characteristics": "smpte2084", "color_trc": "bt709"}),
            None,
        );
        assert_eq!(
            metadata.property(&["color_transfer", "transfer_characteristics", "color_trc"]),
            Some("smpte2084")
        );
        assert_eq!(metadata.property(&["missing"]), None);
    }

    #[test]
    fn test_frame_overlay() {
        let stream = json!({
            "color_transfer": "bt709",
            "color_primaries": "bt2020",
            "side_data_list": [{"side_data_type": "DOVI configuration record"}]
        });
        let frame = json!({
            "color_transfer": "smpte2084",
            "color_primaries": "",
            "side_data_list": [{"side_data_type": "Mastering display metadata", "max_luminance": "1000/1"}]
        });
        let metadata = ProbeMetadata::from_json(&stream, Some(&frame));

        assert_eq!(metadata.property(&["color_transfer"]), Some("smpte2084"));
        assert_eq!(metadata.property(&["color_primaries"]), Some("bt2020"));
        assert_eq!(metadata.side_data.len(), 2);
        assert_eq!(metadata.side_data[1].field("max_luminance"), Some("1000/1"));
    }

    #[test]
    fn test_side_data_markers_search_nested_content() {
        let metadata = ProbeMetadata::from_json(
            &json!({"side_data_list": [{"side_data_type": "Unknown", "payload": {"name": "DV_RPU"}}]}),
            None,
        );
        assert!(metadata.any_side_data_marker(&["dv_rpu"]));
        assert!(!metadata.any_side_data_marker(&["dhdr"]));
    }

    #[test]
    fn test_tag_containing() {
        let metadata = ProbeMetadata::from_json(
            &json!({"tags": {"DV_PROFILE": "8.1", "encoder": "x"}}),
            None,
        );
        assert_eq!(metadata.tag_containing("dv_profile"), Some("8.1"));
    }
}
