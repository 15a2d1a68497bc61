use std::io::Cursor;

use tracing::{debug, instrument};

use crate::compression::header::DracoHeader;
use crate::compression::sequential;
use crate::geometry::Geometry;
use crate::mesh::Mesh;
use crate::point_cloud::PointCloud;
use crate::status::{DracoError, DracoResult};
use crate::types::EncodedGeometryType;

/// Restores geometry from buffers produced by [`crate::Encoder`].
///
/// Decoding into an existing container replaces its previous content. On
/// failure the container is left cleared.
#[derive(Debug, Clone, Default)]
pub struct Decoder;

impl Decoder {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all)]
    pub fn decode_mesh(&self, data: &[u8], out: &mut Mesh) -> DracoResult<()> {
        out.clear();
        let mut cursor = Cursor::new(data);
        let header = read_header(&mut cursor)?;
        if header.geometry_type() != EncodedGeometryType::TriangularMesh {
            return Err(DracoError::draco("Input is not a mesh."));
        }
        if let Err(err) = sequential::decode_mesh_body(&mut cursor, out) {
            out.clear();
            return Err(err);
        }
        debug!("Decoded mesh: {} faces, {} points", out.num_faces(), out.num_points());
        Ok(())
    }

    #[instrument(skip_all)]
    pub fn decode_point_cloud(&self, data: &[u8], out: &mut PointCloud) -> DracoResult<()> {
        out.clear();
        let mut cursor = Cursor::new(data);
        let header = read_header(&mut cursor)?;
        if header.geometry_type() != EncodedGeometryType::PointCloud {
            return Err(DracoError::draco("Input is not a point cloud."));
        }
        if let Err(err) = sequential::decode_point_cloud_body(&mut cursor, out) {
            out.clear();
            return Err(err);
        }
        debug!(
            "Decoded point cloud: {} points, {} attributes",
            out.num_points(),
            out.num_attributes()
        );
        Ok(())
    }

    /// Decodes whichever geometry kind the buffer holds.
    pub fn decode(&self, data: &[u8]) -> DracoResult<Geometry> {
        let mut cursor = Cursor::new(data);
        match read_header(&mut cursor)?.geometry_type() {
            EncodedGeometryType::TriangularMesh => {
                let mut mesh = Mesh::new();
                self.decode_mesh(data, &mut mesh)?;
                Ok(Geometry::Mesh(mesh))
            }
            EncodedGeometryType::PointCloud => {
                let mut pc = PointCloud::new();
                self.decode_point_cloud(data, &mut pc)?;
                Ok(Geometry::PointCloud(pc))
            }
            EncodedGeometryType::Invalid => Err(DracoError::invalid_parameter("Unsupported geometry type.")),
        }
    }
}

fn read_header(cursor: &mut Cursor<&[u8]>) -> DracoResult<DracoHeader> {
    let header = DracoHeader::parse(cursor)?;
    if header.geometry_type() == EncodedGeometryType::Invalid {
        return Err(DracoError::invalid_parameter("Unsupported geometry type."));
    }
    header.check_supported()?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;

    #[test]
    fn short_input_fails_with_header_error() {
        let mut mesh = Mesh::new();
        let err = Decoder::new().decode_mesh(&[1, 2, 3], &mut mesh).unwrap_err();
        assert_eq!(err.code(), StatusCode::IoError);
        assert_eq!(err.message(), "Failed to parse Draco header.");
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let pc_bytes = crate::Encoder::new().encode_point_cloud(&PointCloud::with_num_points(3)).unwrap();
        let mut mesh = Mesh::new();
        let err = Decoder::new().decode_mesh(&pc_bytes, &mut mesh).unwrap_err();
        assert_eq!(err.message(), "Input is not a mesh.");

        let mesh_bytes = crate::Encoder::new().encode_mesh(&Mesh::new()).unwrap();
        let mut pc = PointCloud::new();
        let err = Decoder::new().decode_point_cloud(&mesh_bytes, &mut pc).unwrap_err();
        assert_eq!(err.code(), StatusCode::DracoError);
        assert_eq!(err.message(), "Input is not a point cloud.");
    }

    #[test]
    fn decode_replaces_previous_content() {
        let bytes = crate::Encoder::new().encode_point_cloud(&PointCloud::with_num_points(3)).unwrap();
        let mut pc = PointCloud::with_num_points(10);
        Decoder::new().decode_point_cloud(&bytes, &mut pc).unwrap();
        assert_eq!(pc.num_points(), 3);
        assert_eq!(pc.num_attributes(), 0);
        assert!(matches!(Decoder::new().decode(&bytes), Ok(Geometry::PointCloud(_))));
    }
}
