//! Uniform quantization of `float32` attribute values.
//!
//! Every component is shifted by its minimum and scaled by one shared range,
//! the largest per-component extent, so all components keep the same precision.

use crate::status::{DracoError, DracoResult};

pub const MAX_QUANTIZATION_BITS: i32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct QuantizationParams {
    bits: u8,
    min_values: Vec<f32>,
    range: f32,
}

impl QuantizationParams {
    /// Derives the transform from the values it will be applied to.
    ///
    /// `values` holds rows of `num_components` floats.
    pub fn compute(values: &[f32], num_components: usize, bits: i32) -> DracoResult<Self> {
        if !(1..=MAX_QUANTIZATION_BITS).contains(&bits) {
            return Err(DracoError::invalid_parameter(format!(
                "Invalid quantization bits {}.",
                bits
            )));
        }
        if num_components == 0 {
            return Err(DracoError::invalid_parameter("Attribute has no components."));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DracoError::invalid_parameter(
                "Cannot quantize non-finite attribute values.",
            ));
        }

        let mut min_values = vec![0.0f32; num_components];
        let mut max_values = vec![0.0f32; num_components];
        if let Some(first) = values.chunks_exact(num_components).next() {
            min_values.copy_from_slice(first);
            max_values.copy_from_slice(first);
        }
        for row in values.chunks_exact(num_components) {
            for (c, &v) in row.iter().enumerate() {
                min_values[c] = min_values[c].min(v);
                max_values[c] = max_values[c].max(v);
            }
        }
        let mut range = min_values
            .iter()
            .zip(&max_values)
            .map(|(min, max)| max - min)
            .fold(0.0f32, f32::max);
        if !range.is_finite() {
            return Err(DracoError::invalid_parameter(
                "Attribute extent is too large to quantize.",
            ));
        }
        if range == 0.0 {
            range = 1.0;
        }

        Ok(Self {
            bits: bits as u8,
            min_values,
            range,
        })
    }

    pub fn from_parts(bits: u8, min_values: Vec<f32>, range: f32) -> DracoResult<Self> {
        if !(1..=MAX_QUANTIZATION_BITS).contains(&i32::from(bits)) || !range.is_finite() || range <= 0.0 {
            return Err(DracoError::draco("Invalid quantization parameters."));
        }
        Ok(Self {
            bits,
            min_values,
            range,
        })
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn min_values(&self) -> &[f32] {
        &self.min_values
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn max_quantized_value(&self) -> u32 {
        (1u32 << self.bits) - 1
    }

    /// Largest absolute difference between a value and its dequantized image.
    pub fn max_error(&self) -> f32 {
        self.range / self.max_quantized_value() as f32 / 2.0
    }

    pub fn quantize(&self, values: &[f32]) -> Vec<u32> {
        let max_q = self.max_quantized_value();
        let inverse_delta = max_q as f32 / self.range;
        let components = self.min_values.len();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let shifted = (v - self.min_values[i % components]) * inverse_delta;
                ((shifted + 0.5).floor() as u32).min(max_q)
            })
            .collect()
    }

    pub fn dequantize(&self, quantized: &[u32]) -> Vec<f32> {
        let delta = self.range / self.max_quantized_value() as f32;
        let components = self.min_values.len();
        quantized
            .iter()
            .enumerate()
            .map(|(i, &q)| q as f32 * delta + self.min_values[i % components])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unit_cube_corners_are_exact() {
        let values = [0.0f32, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0];
        let params = QuantizationParams::compute(&values, 3, 8).unwrap();
        assert_eq!(params.range(), 1.0);
        let q = params.quantize(&values);
        assert_eq!(q, vec![0, 0, 0, 255, 255, 255, 0, 255, 0]);
        for (a, b) in values.iter().zip(params.dequantize(&q)) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn flat_data_uses_unit_range() {
        let params = QuantizationParams::compute(&[2.0, 2.0, 2.0, 2.0], 2, 4).unwrap();
        assert_eq!(params.range(), 1.0);
        assert_eq!(params.quantize(&[2.0, 2.0]), vec![0, 0]);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(QuantizationParams::compute(&[1.0], 1, 0).is_err());
        assert!(QuantizationParams::compute(&[1.0], 1, 31).is_err());
        assert!(QuantizationParams::compute(&[f32::NAN], 1, 8).is_err());
        assert!(QuantizationParams::from_parts(8, vec![0.0], 0.0).is_err());
    }

    #[test]
    fn overflowing_extent_is_rejected() {
        let values = [-3e38f32, 0.0, 0.0, 3e38, 1.0, 1.0];
        let err = QuantizationParams::compute(&values, 3, 11).unwrap_err();
        assert_eq!(err.code(), crate::status::StatusCode::InvalidParameter);

        let params = QuantizationParams::compute(&[-1e38f32, 1e38], 1, 11).unwrap();
        assert!(params.range().is_finite());
        assert!(QuantizationParams::from_parts(params.bits(), params.min_values().to_vec(), params.range()).is_ok());
    }

    proptest! {
        #[test]
        fn error_is_bounded(
            values in proptest::collection::vec(-1000.0f32..1000.0, 3..60),
            bits in 8i32..=16,
        ) {
            let usable = values.len() / 3 * 3;
            let values = &values[..usable];
            let params = QuantizationParams::compute(values, 3, bits).unwrap();
            let decoded = params.dequantize(&params.quantize(values));
            let tolerance = params.max_error() * 1.01 + 1e-3;
            for (a, b) in values.iter().zip(&decoded) {
                prop_assert!((a - b).abs() <= tolerance, "{} vs {}", a, b);
            }
        }
    }
}
