use std::ops::{Deref, DerefMut};

use crate::point_cloud::PointCloud;
use crate::types::{Face, FaceIndex, PointIndex};

/// A point cloud with triangle connectivity.
///
/// Derefs to the underlying [`PointCloud`] so every point and attribute query
/// works on a mesh unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    point_cloud: PointCloud,
    faces: Vec<Face>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_point_cloud(&self) -> &PointCloud {
        &self.point_cloud
    }

    pub fn as_point_cloud_mut(&mut self) -> &mut PointCloud {
        &mut self.point_cloud
    }

    pub fn num_faces(&self) -> u32 {
        self.faces.len() as u32
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face(&self, index: FaceIndex) -> Option<&Face> {
        self.faces.get(index.0 as usize)
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// Sets face `index`, growing the face list with degenerate faces if needed.
    pub fn set_face(&mut self, index: FaceIndex, face: Face) {
        let i = index.0 as usize;
        if i >= self.faces.len() {
            self.faces.resize(i + 1, [PointIndex(0); 3]);
        }
        self.faces[i] = face;
    }

    pub fn set_num_faces(&mut self, num_faces: u32) {
        self.faces.resize(num_faces as usize, [PointIndex(0); 3]);
    }

    /// Writes the corner indices of every face, one triple per face.
    ///
    /// `out` must hold exactly `num_faces * 3` entries, otherwise nothing is written.
    pub fn copy_indices(&self, out: &mut [u32]) -> bool {
        if out.len() != self.faces.len() * 3 {
            return false;
        }
        for (face, row) in self.faces.iter().zip(out.chunks_exact_mut(3)) {
            row[0] = face[0].0;
            row[1] = face[1].0;
            row[2] = face[2].0;
        }
        true
    }

    pub fn indices(&self) -> Vec<u32> {
        self.faces
            .iter()
            .flat_map(|face| face.iter().map(|corner| corner.0))
            .collect()
    }

    /// Merges points with identical attribute values and rewrites faces to match.
    pub fn deduplicate_point_ids(&mut self) {
        let remap = self.point_cloud.deduplicate_point_ids();
        for face in &mut self.faces {
            for corner in face.iter_mut() {
                if let Some(&new_index) = remap.get(corner.0 as usize) {
                    *corner = new_index;
                }
            }
        }
    }

    /// True when every face corner references an existing point.
    pub fn faces_are_valid(&self) -> bool {
        let num_points = self.point_cloud.num_points();
        self.faces
            .iter()
            .all(|face| face.iter().all(|corner| corner.0 < num_points))
    }

    /// Drops faces, points and attributes.
    pub fn clear(&mut self) {
        self.faces.clear();
        self.point_cloud.clear();
    }
}

impl Deref for Mesh {
    type Target = PointCloud;

    fn deref(&self) -> &PointCloud {
        &self.point_cloud
    }
}

impl DerefMut for Mesh {
    fn deref_mut(&mut self) -> &mut PointCloud {
        &mut self.point_cloud
    }
}
