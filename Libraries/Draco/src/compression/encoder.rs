use tracing::{debug, instrument};

use crate::compression::header::DracoHeader;
use crate::compression::options::EncoderOptions;
use crate::compression::sequential;
use crate::mesh::Mesh;
use crate::point_cloud::PointCloud;
use crate::status::{DracoError, DracoResult};
use crate::types::{EncodedGeometryType, GeometryAttributeType};

/// Compresses point clouds and meshes into self-describing buffers.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    options: EncoderOptions,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EncoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Sets the quantization bit depth for every attribute of the given semantic.
    ///
    /// `bits <= 0` turns quantization off. Depths above 30 are rejected when encoding.
    pub fn set_attribute_quantization(&mut self, attribute_type: GeometryAttributeType, bits: i32) {
        self.options.set_attribute_quantization(attribute_type, bits);
    }

    #[instrument(skip_all)]
    pub fn encode_point_cloud(&self, pc: &PointCloud) -> DracoResult<Vec<u8>> {
        let mut out = Vec::new();
        DracoHeader::new(EncodedGeometryType::PointCloud)
            .write(&mut out)
            .map_err(|err| DracoError::io(err.to_string()))?;
        sequential::encode_point_cloud_body(pc, &self.options, &mut out)?;
        debug!(
            "Encoded point cloud: {} points, {} attributes, {} bytes",
            pc.num_points(),
            pc.num_attributes(),
            out.len()
        );
        Ok(out)
    }

    #[instrument(skip_all)]
    pub fn encode_mesh(&self, mesh: &Mesh) -> DracoResult<Vec<u8>> {
        let mut out = Vec::new();
        DracoHeader::new(EncodedGeometryType::TriangularMesh)
            .write(&mut out)
            .map_err(|err| DracoError::io(err.to_string()))?;
        sequential::encode_mesh_body(mesh, &self.options, &mut out)?;
        debug!(
            "Encoded mesh: {} faces, {} points, {} bytes",
            mesh.num_faces(),
            mesh.num_points(),
            out.len()
        );
        Ok(out)
    }
}
