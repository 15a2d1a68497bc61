use std::collections::HashMap;

use crate::attribute::PointAttribute;
use crate::component::Component;
use crate::extract::{self, ExtractTarget};
use crate::types::{AttributeValueIndex, DataType, GeometryAttributeType, PointIndex};

/// An unordered set of points, each carrying one value per attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    num_points: u32,
    attributes: Vec<PointAttribute>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_points(num_points: u32) -> Self {
        Self {
            num_points,
            attributes: Vec::new(),
        }
    }

    pub fn num_points(&self) -> u32 {
        self.num_points
    }

    pub fn set_num_points(&mut self, num_points: u32) {
        self.num_points = num_points;
    }

    pub fn num_attributes(&self) -> i32 {
        self.attributes.len() as i32
    }

    pub fn attributes(&self) -> &[PointAttribute] {
        &self.attributes
    }

    /// Appends an attribute and returns its slot. The slot doubles as unique id.
    pub fn add_attribute(&mut self, mut attribute: PointAttribute) -> i32 {
        let att_id = self.attributes.len() as i32;
        attribute.set_unique_id(att_id as u32);
        self.attributes.push(attribute);
        att_id
    }

    /// Appends an attribute keeping the unique id it already carries.
    pub(crate) fn push_attribute(&mut self, attribute: PointAttribute) -> i32 {
        self.attributes.push(attribute);
        self.attributes.len() as i32 - 1
    }

    /// Attribute at slot `att_id`, valid range `[0, num_attributes)`.
    pub fn attribute(&self, att_id: i32) -> Option<&PointAttribute> {
        usize::try_from(att_id).ok().and_then(|i| self.attributes.get(i))
    }

    pub fn attribute_mut(&mut self, att_id: i32) -> Option<&mut PointAttribute> {
        usize::try_from(att_id).ok().and_then(|i| self.attributes.get_mut(i))
    }

    /// Slot of the first attribute with the given semantic, or -1.
    pub fn named_attribute_id(&self, attribute_type: GeometryAttributeType) -> i32 {
        self.attributes
            .iter()
            .position(|attribute| attribute.attribute_type() == attribute_type)
            .map_or(-1, |i| i as i32)
    }

    pub fn named_attribute(&self, attribute_type: GeometryAttributeType) -> Option<&PointAttribute> {
        self.attribute(self.named_attribute_id(attribute_type))
    }

    pub fn attribute_by_unique_id(&self, unique_id: u32) -> Option<&PointAttribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.unique_id() == unique_id)
    }

    /// Copies `attribute` for every point into `out`, converting to `T`.
    ///
    /// `out` must hold exactly `num_points * num_components` values.
    pub fn attribute_data<T: ExtractTarget>(&self, attribute: &PointAttribute, out: &mut [T]) -> bool {
        extract::attribute_data(self, attribute, out)
    }

    /// Byte-level extractor selected by a runtime type tag.
    pub fn attribute_data_bytes(
        &self,
        attribute: &PointAttribute,
        data_type: DataType,
        out: &mut [u8],
    ) -> bool {
        extract::attribute_data_bytes(self, attribute, data_type, out)
    }

    /// Allocating variant of [`PointCloud::attribute_data`].
    pub fn attribute_values<T: ExtractTarget>(&self, attribute: &PointAttribute) -> Option<Vec<T>> {
        let len = self.num_points as usize * usize::from(attribute.num_components());
        let mut out = vec![T::default(); len];
        self.attribute_data(attribute, &mut out).then_some(out)
    }

    /// Values of one point as `T`, resolved through the point's mapping.
    pub fn point_value<T: Component>(&self, attribute: &PointAttribute, point: PointIndex) -> Option<Vec<T>> {
        if point.0 >= self.num_points {
            return None;
        }
        let mut out = vec![T::default(); usize::from(attribute.num_components())];
        attribute
            .convert_value(attribute.mapped_index(point), &mut out)
            .then_some(out)
    }

    pub fn deduplicate_attribute_values(&mut self) {
        let num_points = self.num_points as usize;
        for attribute in &mut self.attributes {
            attribute.deduplicate_values(num_points);
        }
    }

    /// Merges points whose attribute value indices are identical in every attribute.
    ///
    /// Returns the new index of every old point. Callers holding point indices
    /// (mesh faces) must remap through it.
    pub fn deduplicate_point_ids(&mut self) -> Vec<PointIndex> {
        let num_points = self.num_points as usize;
        let mut lookup: HashMap<Vec<AttributeValueIndex>, PointIndex> = HashMap::new();
        let mut remap = Vec::with_capacity(num_points);
        let mut unique_points = Vec::new();
        for point in (0..self.num_points).map(PointIndex) {
            let key: Vec<AttributeValueIndex> = self
                .attributes
                .iter()
                .map(|attribute| attribute.mapped_index(point))
                .collect();
            let next = PointIndex(unique_points.len() as u32);
            let index = *lookup.entry(key).or_insert_with(|| {
                unique_points.push(point);
                next
            });
            remap.push(index);
        }
        if unique_points.len() == num_points {
            return remap;
        }

        for attribute in &mut self.attributes {
            let map = unique_points
                .iter()
                .map(|&point| attribute.mapped_index(point))
                .collect();
            attribute.set_indices_map(map);
        }
        self.num_points = unique_points.len() as u32;
        remap
    }

    /// Drops all points and attributes.
    pub fn clear(&mut self) {
        self.num_points = 0;
        self.attributes.clear();
    }
}
