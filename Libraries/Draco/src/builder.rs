//! Builders that turn flat typed arrays into finished geometry.
//!
//! Both builders follow the same session: `start` fixes the entry count,
//! `set_attribute` copies one flat array per attribute, `get` hands out the
//! finished container and leaves the builder empty until the next `start`.

use tracing::{debug, warn};

use crate::attribute::{PointAttribute, MAX_NUM_COMPONENTS};
use crate::component::{to_ne_bytes, Component};
use crate::mesh::Mesh;
use crate::point_cloud::PointCloud;
use crate::types::{AttributeValueIndex, DataType, Face, FaceIndex, GeometryAttributeType, PointIndex};

/// Attribute id returned when no attribute was added.
pub const INVALID_ATTRIBUTE_ID: i32 = -1;

/// Largest face count a mesh session can hold.
pub const MAX_NUM_FACES: u32 = u32::MAX / 3;

/// Builds a [`PointCloud`] from per-point arrays.
#[derive(Debug, Default)]
pub struct PointCloudBuilder {
    point_cloud: Option<PointCloud>,
}

impl PointCloudBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a session for `num_points` points, discarding any unfinished one.
    pub fn start(&mut self, num_points: u32) {
        self.point_cloud = Some(PointCloud::with_num_points(num_points));
    }

    pub fn is_started(&self) -> bool {
        self.point_cloud.is_some()
    }

    /// Adds an empty attribute sized for every point. Returns its id, or -1 outside a session.
    pub fn add_attribute(
        &mut self,
        attribute_type: GeometryAttributeType,
        num_components: u8,
        data_type: DataType,
    ) -> i32 {
        let Some(pc) = self.point_cloud.as_mut() else {
            return INVALID_ATTRIBUTE_ID;
        };
        let mut attribute = PointAttribute::new(attribute_type, num_components, data_type, false);
        attribute.reset(pc.num_points() as usize);
        pc.add_attribute(attribute)
    }

    /// Writes one point's value. `bytes` holds one native-endian value of the attribute's type.
    pub fn set_attribute_value_for_point(&mut self, att_id: i32, point: PointIndex, bytes: &[u8]) -> bool {
        self.point_cloud
            .as_mut()
            .and_then(|pc| pc.attribute_mut(att_id))
            .is_some_and(|attribute| attribute.set_value_bytes(AttributeValueIndex(point.0), bytes))
    }

    /// Registers an attribute and fills it from `src`, one row of
    /// `num_components` values per point.
    ///
    /// A missing `src` adds nothing and returns -1.
    pub fn set_attribute<T: Component>(
        &mut self,
        num_points: usize,
        src: Option<&[T]>,
        attribute_type: GeometryAttributeType,
        num_components: u8,
    ) -> i32 {
        let Some(src) = src else {
            return INVALID_ATTRIBUTE_ID;
        };
        self.set_attribute_rows::<T>(num_points, &to_ne_bytes(src), attribute_type, num_components)
    }

    /// Untyped variant of [`PointCloudBuilder::set_attribute`] keyed by a raw type tag.
    ///
    /// Unknown type tags are ignored and return -1.
    pub fn set_attribute_bytes(
        &mut self,
        num_points: usize,
        src: Option<&[u8]>,
        attribute_type: GeometryAttributeType,
        num_components: u8,
        data_type: u32,
    ) -> i32 {
        let Some(src) = src else {
            return INVALID_ATTRIBUTE_ID;
        };
        crate::dispatch_data_type!(
            DataType::from_raw(data_type),
            T => self.set_attribute_rows::<T>(num_points, src, attribute_type, num_components),
            _ => {
                debug!("Ignoring attribute with unknown data type {}", data_type);
                INVALID_ATTRIBUTE_ID
            }
        )
    }

    fn set_attribute_rows<T: Component>(
        &mut self,
        num_points: usize,
        src: &[u8],
        attribute_type: GeometryAttributeType,
        num_components: u8,
    ) -> i32 {
        let Some(target) = self.point_cloud.as_ref().map(PointCloud::num_points) else {
            warn!("set_attribute called before start");
            return INVALID_ATTRIBUTE_ID;
        };
        let row_size = usize::from(num_components) * T::size();
        if !valid_request(attribute_type, num_components, src.len(), num_points * row_size) {
            return INVALID_ATTRIBUTE_ID;
        }

        let att_id = self.add_attribute(attribute_type, num_components, T::DATA_TYPE);
        let mut row = vec![0u8; row_size];
        for (i, src_row) in src.chunks_exact(row_size).take(num_points.min(target as usize)).enumerate() {
            copy_row::<T>(src_row, &mut row);
            self.set_attribute_value_for_point(att_id, PointIndex(i as u32), &row);
        }
        att_id
    }

    /// Hands out the finished point cloud. Points are never merged.
    pub fn get(&mut self) -> Option<PointCloud> {
        self.finalize(false)
    }

    /// Hands out the finished point cloud, optionally merging identical points.
    pub fn finalize(&mut self, deduplicate_points: bool) -> Option<PointCloud> {
        let mut pc = self.point_cloud.take()?;
        if deduplicate_points {
            pc.deduplicate_attribute_values();
            pc.deduplicate_point_ids();
        }
        Some(pc)
    }
}

/// Builds a [`Mesh`] from a triangle soup: every face owns its three corners.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: Option<Mesh>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a session for `num_faces` faces, discarding any unfinished one.
    ///
    /// The face count is capped at `u32::MAX / 3` so every corner has a point index.
    pub fn start(&mut self, num_faces: u32) {
        let num_faces = num_faces.min(MAX_NUM_FACES);
        let mut mesh = Mesh::new();
        mesh.set_num_points(num_faces * 3);
        for f in 0..num_faces {
            mesh.add_face(soup_face(f));
        }
        self.mesh = Some(mesh);
    }

    pub fn is_started(&self) -> bool {
        self.mesh.is_some()
    }

    /// Adds an empty attribute with one value per face corner. Returns its id, or -1 outside a session.
    pub fn add_attribute(
        &mut self,
        attribute_type: GeometryAttributeType,
        num_components: u8,
        data_type: DataType,
    ) -> i32 {
        let Some(mesh) = self.mesh.as_mut() else {
            return INVALID_ATTRIBUTE_ID;
        };
        let mut attribute = PointAttribute::new(attribute_type, num_components, data_type, false);
        attribute.reset(mesh.num_points() as usize);
        mesh.add_attribute(attribute)
    }

    /// Writes the three corner values of one face.
    pub fn set_attribute_values_for_face(
        &mut self,
        att_id: i32,
        face: FaceIndex,
        corner0: &[u8],
        corner1: &[u8],
        corner2: &[u8],
    ) -> bool {
        let Some(attribute) = self.mesh.as_mut().and_then(|mesh| mesh.attribute_mut(att_id)) else {
            return false;
        };
        let first = face.0 * 3;
        attribute.set_value_bytes(AttributeValueIndex(first), corner0)
            && attribute.set_value_bytes(AttributeValueIndex(first + 1), corner1)
            && attribute.set_value_bytes(AttributeValueIndex(first + 2), corner2)
    }

    /// Registers an attribute and fills it from `src`, one row of
    /// `3 * num_components` values per face (corner after corner).
    ///
    /// A missing `src` adds nothing and returns -1.
    pub fn set_attribute<T: Component>(
        &mut self,
        num_faces: usize,
        src: Option<&[T]>,
        attribute_type: GeometryAttributeType,
        num_components: u8,
    ) -> i32 {
        let Some(src) = src else {
            return INVALID_ATTRIBUTE_ID;
        };
        self.set_attribute_rows::<T>(num_faces, &to_ne_bytes(src), attribute_type, num_components)
    }

    /// Untyped variant of [`MeshBuilder::set_attribute`] keyed by a raw type tag.
    ///
    /// Unknown type tags are ignored and return -1.
    pub fn set_attribute_bytes(
        &mut self,
        num_faces: usize,
        src: Option<&[u8]>,
        attribute_type: GeometryAttributeType,
        num_components: u8,
        data_type: u32,
    ) -> i32 {
        let Some(src) = src else {
            return INVALID_ATTRIBUTE_ID;
        };
        crate::dispatch_data_type!(
            DataType::from_raw(data_type),
            T => self.set_attribute_rows::<T>(num_faces, src, attribute_type, num_components),
            _ => {
                debug!("Ignoring attribute with unknown data type {}", data_type);
                INVALID_ATTRIBUTE_ID
            }
        )
    }

    fn set_attribute_rows<T: Component>(
        &mut self,
        num_faces: usize,
        src: &[u8],
        attribute_type: GeometryAttributeType,
        num_components: u8,
    ) -> i32 {
        let Some(target) = self.mesh.as_ref().map(Mesh::num_faces) else {
            warn!("set_attribute called before start");
            return INVALID_ATTRIBUTE_ID;
        };
        let corner_size = usize::from(num_components) * T::size();
        let row_size = corner_size * 3;
        if !valid_request(attribute_type, num_components, src.len(), num_faces * row_size) {
            return INVALID_ATTRIBUTE_ID;
        }

        let att_id = self.add_attribute(attribute_type, num_components, T::DATA_TYPE);
        let mut row = vec![0u8; row_size];
        for (f, src_row) in src.chunks_exact(row_size).take(num_faces.min(target as usize)).enumerate() {
            copy_row::<T>(src_row, &mut row);
            let (corner0, rest) = row.split_at(corner_size);
            let (corner1, corner2) = rest.split_at(corner_size);
            self.set_attribute_values_for_face(att_id, FaceIndex(f as u32), corner0, corner1, corner2);
        }
        att_id
    }

    /// Hands out the finished mesh.
    ///
    /// Identical attribute values are merged first, then corners whose values
    /// all match collapse into one shared point.
    pub fn get(&mut self) -> Option<Mesh> {
        let mut mesh = self.mesh.take()?;
        mesh.deduplicate_attribute_values();
        mesh.deduplicate_point_ids();
        Some(mesh)
    }
}

/// Corners of one triangle-soup face, three points of its own. `face` must be below `MAX_NUM_FACES`.
fn soup_face(face: u32) -> Face {
    let first = face * 3;
    [PointIndex(first), PointIndex(first + 1), PointIndex(first + 2)]
}

fn valid_request(
    attribute_type: GeometryAttributeType,
    num_components: u8,
    available: usize,
    required: usize,
) -> bool {
    if attribute_type == GeometryAttributeType::Invalid
        || num_components == 0
        || num_components > MAX_NUM_COMPONENTS
    {
        debug!("Ignoring attribute with invalid semantic or component count {}", num_components);
        return false;
    }
    if available < required {
        warn!("Attribute source holds {} bytes, {} required", available, required);
        return false;
    }
    true
}

/// Copies one row value by value, canonicalising each component through `T`.
fn copy_row<T: Component>(src: &[u8], dst: &mut [u8]) {
    let size = T::size();
    for (from, to) in src.chunks_exact(size).zip(dst.chunks_exact_mut(size)) {
        T::read_ne(from).write_ne(to);
    }
}
