use crate::resources::geometry::Geometry;
use crate::resources::material::Material;

/// Geometry paired with the material that draws it.
///
/// A point cloud is a single `Mesh` with a [`Material::PointCloud`]; a mesh
/// container produces one `Mesh` per primitive, spread over its node tree.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self { geometry, material }
    }

    #[inline]
    #[must_use]
    pub fn is_points(&self) -> bool {
        matches!(self.material, Material::PointCloud(_))
    }
}
