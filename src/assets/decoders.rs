//! Decoder seams and the CPU-side data they produce.
//!
//! Decoders only turn a path into data. They never touch the scene or the
//! registry, so any number of them can be in flight at once.

use futures::future::BoxFuture;
use glam::{Quat, Vec3};

use crate::errors::Result;
use crate::resources::mesh::Mesh;
use crate::resources::texture::Texture;

/// Storage type of decoded color channels, as declared by the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorDepth {
    /// Floating point, already in `[0, 1]`.
    #[default]
    Unit,
    U8,
    U16,
    U32,
}

impl ColorDepth {
    /// Channel value that means full intensity.
    #[must_use]
    pub fn full_scale(self) -> f32 {
        match self {
            Self::Unit => 1.0,
            Self::U8 => f32::from(u8::MAX),
            Self::U16 => f32::from(u16::MAX),
            Self::U32 => u32::MAX as f32,
        }
    }
}

/// Raw point-cloud buffers as they come out of the file.
///
/// Colors keep the file's range; `color_depth` says how to normalize them.
#[derive(Debug, Clone, Default)]
pub struct DecodedPointCloud {
    pub positions: Vec<[f32; 3]>,
    pub colors: Option<Vec<[f32; 3]>>,
    pub color_depth: ColorDepth,
}

/// One node of a decoded mesh container.
#[derive(Debug, Clone)]
pub struct DecodedNode {
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub mesh: Option<Mesh>,
    pub children: Vec<DecodedNode>,
}

impl DecodedNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: DecodedNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Node forest of a mesh container's default scene.
#[derive(Debug, Clone, Default)]
pub struct DecodedMesh {
    pub roots: Vec<DecodedNode>,
}

/// Decoder output, tagged by kind.
#[derive(Debug, Clone)]
pub enum DecodedAsset {
    PointCloud(DecodedPointCloud),
    Mesh(DecodedMesh),
}

pub trait PointCloudDecoder: Send + Sync {
    fn decode<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<DecodedPointCloud>>;
}

pub trait MeshDecoder: Send + Sync {
    fn decode<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<DecodedMesh>>;
}

pub trait TextureDecoder: Send + Sync {
    fn decode<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Texture>>;
}
