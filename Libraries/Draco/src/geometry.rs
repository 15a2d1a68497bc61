use crate::mesh::Mesh;
use crate::point_cloud::PointCloud;
use crate::types::EncodedGeometryType;

/// Either kind of decoded or built geometry.
///
/// This is the object behind every point-cloud and mesh handle on the C
/// boundary. Point-cloud queries work on both variants, mesh queries only on
/// [`Geometry::Mesh`].
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    PointCloud(PointCloud),
    Mesh(Mesh),
}

impl Geometry {
    pub fn geometry_type(&self) -> EncodedGeometryType {
        match self {
            Geometry::PointCloud(_) => EncodedGeometryType::PointCloud,
            Geometry::Mesh(_) => EncodedGeometryType::TriangularMesh,
        }
    }

    pub fn point_cloud(&self) -> &PointCloud {
        match self {
            Geometry::PointCloud(pc) => pc,
            Geometry::Mesh(mesh) => mesh.as_point_cloud(),
        }
    }

    pub fn point_cloud_mut(&mut self) -> &mut PointCloud {
        match self {
            Geometry::PointCloud(pc) => pc,
            Geometry::Mesh(mesh) => mesh.as_point_cloud_mut(),
        }
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match self {
            Geometry::Mesh(mesh) => Some(mesh),
            Geometry::PointCloud(_) => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match self {
            Geometry::Mesh(mesh) => Some(mesh),
            Geometry::PointCloud(_) => None,
        }
    }
}

impl From<PointCloud> for Geometry {
    fn from(pc: PointCloud) -> Self {
        Geometry::PointCloud(pc)
    }
}

impl From<Mesh> for Geometry {
    fn from(mesh: Mesh) -> Self {
        Geometry::Mesh(mesh)
    }
}
