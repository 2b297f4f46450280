use glam::Vec3;
use uuid::Uuid;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` for an empty set.
    #[must_use]
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let mut iter = points.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the longest edge.
    #[must_use]
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }
}

/// CPU-side vertex data for a point cloud or a mesh primitive.
///
/// The render backend uploads it on first use and frees the GPU copy when
/// the engine calls [`RenderBackend::release`](crate::backend::RenderBackend::release)
/// with this geometry's id.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub uuid: Uuid,
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Linear-range (0..=1) vertex colors, one per position.
    pub colors: Option<Vec<[f32; 3]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub indices: Option<Vec<u32>>,

    bounding_box: Option<BoundingBox>,
}

impl Geometry {
    #[must_use]
    pub fn new(name: impl Into<String>, positions: Vec<[f32; 3]>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            positions,
            colors: None,
            normals: None,
            indices: None,
            bounding_box: None,
        }
    }

    #[must_use]
    pub fn with_colors(mut self, colors: Vec<[f32; 3]>) -> Self {
        self.colors = Some(colors);
        self
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Recomputes and caches the bounding box.
    pub fn compute_bounding_box(&mut self) -> Option<BoundingBox> {
        self.bounding_box = BoundingBox::from_points(&self.positions);
        self.bounding_box
    }

    /// Last computed bounding box.
    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    /// Translates every position by `offset` and keeps the cached box in sync.
    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p = (Vec3::from_array(*p) + offset).to_array();
        }
        if let Some(bbox) = &mut self.bounding_box {
            bbox.min += offset;
            bbox.max += offset;
        }
    }

    /// Moves the bounding box center to the origin. Returns the applied offset.
    pub fn center(&mut self) -> Vec3 {
        let Some(bbox) = self.bounding_box.or_else(|| self.compute_bounding_box()) else {
            return Vec3::ZERO;
        };
        let offset = -bbox.center();
        self.translate(offset);
        offset
    }
}
