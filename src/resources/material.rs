//! Materials
//!
//! Two material families exist, one per asset kind:
//!
//! - [`PointCloudMaterial`]: custom shader with independent opacity,
//!   brightness and point-size uniforms (see `shaders/point_cloud.wgsl`).
//! - [`MeshMaterial`]: the native material decoded with a mesh container,
//!   whose alpha receives the object opacity.
//!
//! The point-cloud fragment stage is mirrored on the CPU by [`shade_point`]
//! so the colour pipeline can be checked without a GPU.

use glam::{Mat4, Vec4};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::resources::texture::Texture;
use crate::settings::{MIN_BRIGHTNESS, MIN_POINT_SIZE};

/// WGSL source of the point-cloud material.
pub const POINT_CLOUD_SHADER: &str = include_str!("shaders/point_cloud.wgsl");

/// Per-instance point data. Must match the instance inputs of `point_cloud.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Uniform block of the point-cloud shader (std140, 96 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointCloudUniforms {
    pub model_view_proj: [[f32; 4]; 4],
    pub viewport_size: [f32; 2],
    pub point_size: f32,
    pub opacity: f32,
    pub brightness: f32,
    pub _pad: [f32; 3],
}

/// Standard sRGB → linear transfer for one channel.
#[inline]
#[must_use]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// CPU reference of the point-cloud fragment stage.
///
/// Brightness is not clamped from above, and alpha is the global opacity.
#[must_use]
pub fn shade_point(color: [f32; 3], brightness: f32, opacity: f32) -> [f32; 4] {
    [
        srgb_to_linear(color[0]) * brightness,
        srgb_to_linear(color[1]) * brightness,
        srgb_to_linear(color[2]) * brightness,
        opacity,
    ]
}

#[derive(Debug, Clone)]
pub struct PointCloudMaterial {
    pub uuid: Uuid,
    opacity: f32,
    brightness: f32,
    point_size: f32,
}

impl PointCloudMaterial {
    #[must_use]
    pub fn new(point_size: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            opacity: 1.0,
            brightness: 1.0,
            point_size: point_size.max(MIN_POINT_SIZE),
        }
    }

    #[inline]
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    #[inline]
    #[must_use]
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    #[inline]
    #[must_use]
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Stores `clamp(v, 0, 1)`.
    pub fn set_opacity(&mut self, v: f32) {
        self.opacity = v.clamp(0.0, 1.0);
    }

    /// Stores `max(v, 0)`; values above 1 brighten.
    pub fn set_brightness(&mut self, v: f32) {
        self.brightness = v.max(MIN_BRIGHTNESS);
    }

    /// Stores `max(v, 0.1)`.
    pub fn set_point_size(&mut self, v: f32) {
        self.point_size = v.max(MIN_POINT_SIZE);
    }

    /// Always blended: translucency is uniform across the whole cloud.
    #[inline]
    #[must_use]
    pub fn transparent(&self) -> bool {
        true
    }

    /// Depth writes stay off so overlapping translucent points do not cut each other out.
    #[inline]
    #[must_use]
    pub fn depth_write(&self) -> bool {
        false
    }

    #[must_use]
    pub fn blend_state(&self) -> wgpu::BlendState {
        wgpu::BlendState::ALPHA_BLENDING
    }

    #[must_use]
    pub fn topology(&self) -> wgpu::PrimitiveTopology {
        wgpu::PrimitiveTopology::TriangleList
    }

    /// Vertices drawn per point; the shader builds the quad from `vertex_index`.
    pub const VERTICES_PER_POINT: u32 = 6;

    /// The single per-point instance buffer layout.
    #[must_use]
    pub fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
        static INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
            wgpu::VertexAttribute {
                shader_location: 0,
                offset: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                shader_location: 1,
                offset: 12,
                format: wgpu::VertexFormat::Float32x3,
            },
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRIBUTES,
        }
    }

    /// Packs the uniform block for one draw.
    #[must_use]
    pub fn uniforms(&self, model_view_proj: Mat4, viewport_size: [f32; 2]) -> PointCloudUniforms {
        PointCloudUniforms {
            model_view_proj: model_view_proj.to_cols_array_2d(),
            viewport_size,
            point_size: self.point_size,
            opacity: self.opacity,
            brightness: self.brightness,
            _pad: [0.0; 3],
        }
    }
}

/// Native material carried by a mesh container.
#[derive(Debug, Clone)]
pub struct MeshMaterial {
    pub uuid: Uuid,
    pub name: String,
    pub base_color: Vec4,
    pub opacity: f32,
    pub transparent: bool,
    pub maps: SmallVec<[Texture; 2]>,
}

impl MeshMaterial {
    #[must_use]
    pub fn new(name: impl Into<String>, base_color: Vec4) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            base_color,
            opacity: base_color.w,
            transparent: base_color.w < 1.0,
            maps: SmallVec::new(),
        }
    }

    /// Routes an object opacity into the material alpha.
    pub fn set_opacity(&mut self, v: f32) {
        self.opacity = v.clamp(0.0, 1.0);
        self.transparent = self.opacity < 1.0;
    }
}

#[derive(Debug, Clone)]
pub enum Material {
    PointCloud(PointCloudMaterial),
    Mesh(MeshMaterial),
}

impl Material {
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::PointCloud(m) => m.uuid,
            Self::Mesh(m) => m.uuid,
        }
    }

    /// Texture maps owned by this material.
    #[must_use]
    pub fn maps(&self) -> &[Texture] {
        match self {
            Self::PointCloud(_) => &[],
            Self::Mesh(m) => &m.maps,
        }
    }

    pub fn set_opacity(&mut self, v: f32) {
        match self {
            Self::PointCloud(m) => m.set_opacity(v),
            Self::Mesh(m) => m.set_opacity(v),
        }
    }
}
