//! Point-cloud and mesh compression with a C-compatible handle API.
//!
//! Geometry is built from flat typed arrays ([`PointCloudBuilder`],
//! [`MeshBuilder`]), compressed with an [`Encoder`], restored with a
//! [`Decoder`] and read back as flat arrays through
//! [`PointCloud::attribute_data`]. The [`ffi`] module exposes the same
//! operations as `extern "C"` functions over opaque handles.

pub mod attribute;
pub mod builder;
pub mod component;
pub mod compression;
pub mod extract;
pub mod ffi;
pub mod geometry;
pub mod logging;
pub mod mesh;
pub mod point_cloud;
pub mod status;
pub mod types;

pub use attribute::PointAttribute;
pub use builder::{MeshBuilder, PointCloudBuilder};
pub use compression::{encoded_geometry_type, Decoder, Encoder, EncoderOptions};
pub use geometry::Geometry;
pub use mesh::Mesh;
pub use point_cloud::PointCloud;
pub use status::{DracoError, DracoResult, Status, StatusCode};
pub use types::{DataType, EncodedGeometryType, GeometryAttributeType};

use tracing::error;

/// Encodes a colored point cloud (xyz `f32` coordinates and rgb `u8` colors).
pub fn encode_draco(coords: Vec<f32>, colors: Vec<u8>) -> DracoResult<Vec<u8>> {
    if coords.len() % 3 != 0 {
        return Err(DracoError::invalid_parameter(
            "Number of coordinates must be a multiple of 3",
        ));
    }
    let num_points = coords.len() / 3;
    if colors.len() != num_points * 3 {
        return Err(DracoError::invalid_parameter(
            "Number of colors must match the number of points",
        ));
    }

    let mut builder = PointCloudBuilder::new();
    builder.start(num_points as u32);
    builder.set_attribute(num_points, Some(&coords[..]), GeometryAttributeType::Position, 3);
    builder.set_attribute(num_points, Some(&colors[..]), GeometryAttributeType::Color, 3);
    let pc = builder
        .get()
        .ok_or_else(|| DracoError::draco("Point cloud builder produced no geometry"))?;

    Encoder::new().encode_point_cloud(&pc).inspect_err(|err| {
        error!("Failed to encode points: {}", err);
    })
}

/// Decodes a buffer produced by [`encode_draco`] back into coordinates and colors.
pub fn decode_draco(encoded_data: Vec<u8>) -> DracoResult<(Vec<f32>, Vec<u8>)> {
    let mut pc = PointCloud::new();
    Decoder::new()
        .decode_point_cloud(&encoded_data, &mut pc)
        .inspect_err(|err| error!("Failed to decode the point cloud: {}", err))?;

    let coords = pc
        .named_attribute(GeometryAttributeType::Position)
        .and_then(|attribute| pc.attribute_values::<f32>(attribute))
        .ok_or_else(|| DracoError::draco("Decoded point cloud has no usable positions"))?;
    let colors = pc
        .named_attribute(GeometryAttributeType::Color)
        .and_then(|attribute| pc.attribute_values::<u8>(attribute))
        .ok_or_else(|| DracoError::draco("Decoded point cloud has no usable colors"))?;
    Ok((coords, colors))
}
