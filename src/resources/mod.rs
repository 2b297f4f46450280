//! Resource definitions
//!
//! CPU-side data the render backend uploads and later releases:
//! - Geometry: vertex buffers and bounds
//! - Material: point-cloud shader contract and native mesh materials
//! - Texture: decoded images and the background environment
//! - Mesh: geometry + material pairs attached to scene nodes

pub mod geometry;
pub mod material;
pub mod mesh;
pub mod texture;

pub use geometry::{BoundingBox, Geometry};
pub use material::{
    Material, MeshMaterial, PointCloudMaterial, PointCloudUniforms, PointInstance,
    POINT_CLOUD_SHADER, shade_point, srgb_to_linear,
};
pub use mesh::Mesh;
pub use texture::{Environment, EnvironmentKind, Texture};
