use std::collections::HashMap;

use crate::component::{convert_components, Component};
use crate::types::{AttributeValueIndex, DataType, GeometryAttributeType, PointIndex};

/// Largest component count an attribute may carry; the C boundary reports it as `i8`.
pub const MAX_NUM_COMPONENTS: u8 = i8::MAX as u8;

/// One typed, strided per-point data channel.
///
/// Values live in a contiguous native-endian buffer. Points reach their value
/// either directly (identity mapping, point `i` reads value `i`) or through an
/// explicit point-to-value map, which lets several points share one stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct PointAttribute {
    attribute_type: GeometryAttributeType,
    data_type: DataType,
    num_components: u8,
    normalized: bool,
    byte_stride: i64,
    byte_offset: i64,
    unique_id: u32,
    buffer: Vec<u8>,
    num_unique_entries: usize,
    indices_map: Option<Vec<AttributeValueIndex>>,
}

impl PointAttribute {
    pub fn new(
        attribute_type: GeometryAttributeType,
        num_components: u8,
        data_type: DataType,
        normalized: bool,
    ) -> Self {
        Self {
            attribute_type,
            data_type,
            num_components,
            normalized,
            byte_stride: (data_type.size() * usize::from(num_components)) as i64,
            byte_offset: 0,
            unique_id: 0,
            buffer: Vec::new(),
            num_unique_entries: 0,
            indices_map: None,
        }
    }

    /// Resizes the value buffer to `num_values` zeroed entries.
    pub fn reset(&mut self, num_values: usize) {
        self.buffer = vec![0u8; num_values * self.stride()];
        self.num_unique_entries = num_values;
    }

    /// Number of stored (unique) values.
    pub fn size(&self) -> usize {
        self.num_unique_entries
    }

    pub fn attribute_type(&self) -> GeometryAttributeType {
        self.attribute_type
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn num_components(&self) -> u8 {
        self.num_components
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    pub fn byte_stride(&self) -> i64 {
        self.byte_stride
    }

    pub fn byte_offset(&self) -> i64 {
        self.byte_offset
    }

    pub fn unique_id(&self) -> u32 {
        self.unique_id
    }

    pub(crate) fn set_unique_id(&mut self, unique_id: u32) {
        self.unique_id = unique_id;
    }

    /// Raw backing store, starting at value 0.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub(crate) fn stride(&self) -> usize {
        self.data_type.size() * usize::from(self.num_components)
    }

    pub fn is_mapping_identity(&self) -> bool {
        self.indices_map.is_none()
    }

    /// Explicit point-to-value map, `None` under identity mapping.
    pub fn indices_map(&self) -> Option<&[AttributeValueIndex]> {
        self.indices_map.as_deref()
    }

    pub fn mapped_index(&self, point: PointIndex) -> AttributeValueIndex {
        match &self.indices_map {
            None => AttributeValueIndex(point.0),
            Some(map) => map
                .get(point.0 as usize)
                .copied()
                .unwrap_or(AttributeValueIndex(u32::MAX)),
        }
    }

    pub fn set_identity_mapping(&mut self) {
        self.indices_map = None;
    }

    /// Switches to an explicit map of `num_points` entries, all pointing at value 0.
    pub fn set_explicit_mapping(&mut self, num_points: usize) {
        self.indices_map = Some(vec![AttributeValueIndex(0); num_points]);
    }

    pub(crate) fn set_indices_map(&mut self, map: Vec<AttributeValueIndex>) {
        self.indices_map = Some(map);
    }

    /// Sets one entry of the explicit map. Ignored under identity mapping or out of range.
    pub fn set_point_map_entry(&mut self, point: PointIndex, value: AttributeValueIndex) {
        if let Some(entry) = self
            .indices_map
            .as_mut()
            .and_then(|map| map.get_mut(point.0 as usize))
        {
            *entry = value;
        }
    }

    /// Bytes of one stored value, `None` past the end of the buffer.
    pub fn value_bytes(&self, index: AttributeValueIndex) -> Option<&[u8]> {
        let stride = self.stride();
        let start = self.byte_offset as usize + index.0 as usize * stride;
        self.buffer.get(start..start + stride)
    }

    /// Overwrites one stored value. `bytes` must hold exactly one value.
    pub fn set_value_bytes(&mut self, index: AttributeValueIndex, bytes: &[u8]) -> bool {
        let stride = self.stride();
        let start = self.byte_offset as usize + index.0 as usize * stride;
        match self.buffer.get_mut(start..start + stride) {
            Some(slot) if bytes.len() == stride => {
                slot.copy_from_slice(bytes);
                true
            }
            _ => false,
        }
    }

    /// Reads one value and converts every component to `O`.
    ///
    /// Fails when the index is past the stored values or any component is not
    /// representable in `O`. Output slots beyond `num_components` are zeroed.
    pub fn convert_value<O: Component>(&self, index: AttributeValueIndex, out: &mut [O]) -> bool {
        let Some(bytes) = self.value_bytes(index) else {
            return false;
        };
        let normalized = self.normalized;
        crate::dispatch_data_type!(
            self.data_type,
            T => convert_components::<T, O>(bytes, normalized, out),
            _ => false
        )
    }

    /// Merges byte-identical values and routes points through an explicit map.
    ///
    /// `num_points` is the point count of the owning geometry. Returns the
    /// number of unique values left.
    pub fn deduplicate_values(&mut self, num_points: usize) -> usize {
        let stride = self.stride();
        if stride == 0 {
            return self.num_unique_entries;
        }
        let mut lookup: HashMap<&[u8], AttributeValueIndex> = HashMap::new();
        let mut remap = Vec::with_capacity(self.num_unique_entries);
        let mut unique_buffer = Vec::new();
        for value in self.buffer.chunks_exact(stride).take(self.num_unique_entries) {
            let next = AttributeValueIndex(lookup.len() as u32);
            let index = *lookup.entry(value).or_insert_with(|| {
                unique_buffer.extend_from_slice(value);
                next
            });
            remap.push(index);
        }
        let unique_count = lookup.len();
        if unique_count == self.num_unique_entries {
            return unique_count;
        }

        let map = match &self.indices_map {
            None => (0..num_points)
                .map(|point| remap.get(point).copied().unwrap_or_default())
                .collect(),
            Some(map) => map
                .iter()
                .map(|value| remap.get(value.0 as usize).copied().unwrap_or_default())
                .collect(),
        };
        self.buffer = unique_buffer;
        self.num_unique_entries = unique_count;
        self.indices_map = Some(map);
        unique_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::to_ne_bytes;

    fn float_attribute(values: &[f32]) -> PointAttribute {
        let mut attribute = PointAttribute::new(GeometryAttributeType::Position, 3, DataType::Float32, false);
        attribute.reset(values.len() / 3);
        for (i, row) in values.chunks_exact(3).enumerate() {
            assert!(attribute.set_value_bytes(AttributeValueIndex(i as u32), &to_ne_bytes(row)));
        }
        attribute
    }

    #[test]
    fn new_attribute_reports_descriptor() {
        let attribute = PointAttribute::new(GeometryAttributeType::Color, 4, DataType::Uint8, true);
        assert_eq!(attribute.byte_stride(), 4);
        assert_eq!(attribute.byte_offset(), 0);
        assert_eq!(attribute.size(), 0);
        assert!(attribute.normalized());
        assert!(attribute.is_mapping_identity());
    }

    #[test]
    fn dedup_shares_values_between_points() {
        let mut attribute = float_attribute(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(attribute.deduplicate_values(3), 2);
        assert!(!attribute.is_mapping_identity());
        assert_eq!(attribute.mapped_index(PointIndex(0)), AttributeValueIndex(0));
        assert_eq!(attribute.mapped_index(PointIndex(1)), AttributeValueIndex(1));
        assert_eq!(attribute.mapped_index(PointIndex(2)), AttributeValueIndex(0));
        assert_eq!(attribute.buffer().len(), 2 * 12);
    }

    #[test]
    fn dedup_without_duplicates_keeps_identity() {
        let mut attribute = float_attribute(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(attribute.deduplicate_values(2), 2);
        assert!(attribute.is_mapping_identity());
    }

    #[test]
    fn convert_value_rejects_missing_index() {
        let attribute = float_attribute(&[1.0, 2.0, 3.0]);
        let mut out = [0i32; 3];
        assert!(attribute.convert_value(AttributeValueIndex(0), &mut out));
        assert_eq!(out, [1, 2, 3]);
        assert!(!attribute.convert_value(AttributeValueIndex(1), &mut out));
    }
}
