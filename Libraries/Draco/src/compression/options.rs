use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::status::{DracoError, DracoResult};
use crate::types::GeometryAttributeType;

/// Per-attribute-type encoder settings.
///
/// Serialized as JSON, e.g. `{"quantization_bits": {"position": 11, "tex_coord": 10}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderOptions {
    /// Bit depth per semantic. Missing entries and values `<= 0` mean no quantization.
    pub quantization_bits: BTreeMap<GeometryAttributeType, i32>,
}

impl EncoderOptions {
    pub fn from_json(json: &str) -> DracoResult<Self> {
        serde_json::from_str(json)
            .map_err(|err| DracoError::invalid_parameter(format!("Invalid encoder options: {}", err)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> DracoResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|err| DracoError::io(format!("Failed to read {}: {}", path.as_ref().display(), err)))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> DracoResult<String> {
        serde_json::to_string(self).map_err(|err| DracoError::draco(err.to_string()))
    }

    pub fn set_attribute_quantization(&mut self, attribute_type: GeometryAttributeType, bits: i32) {
        self.quantization_bits.insert(attribute_type, bits);
    }

    /// Configured bit depth, 0 when quantization is off for this semantic.
    pub fn attribute_quantization(&self, attribute_type: GeometryAttributeType) -> i32 {
        self.quantization_bits
            .get(&attribute_type)
            .copied()
            .unwrap_or(0)
    }
}
