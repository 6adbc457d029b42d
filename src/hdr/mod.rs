//! HDR classification and encoder parameter synthesis.
//!
//! [`classify`] turns probe output for one video stream into an
//! [`HdrMetadata`]; [`synthesize`] turns that into the ordered parameter
//! tokens a given encoder family needs to carry the HDR signalling through.

pub mod detection;
pub mod encoding;
pub mod metadata;
pub mod probe;
pub mod types;

pub use detection::{classify, classify_probe, color_metadata, detect_format, FORMAT_RULES};
pub use encoding::{synthesize, EncoderFamily, EncoderParameterSet, PARAMETER_RULES};
pub use metadata::HdrMetadataExtractor;
pub use probe::{ProbeMetadata, SideDataEntry};
pub use types::*;
