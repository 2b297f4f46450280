use std::borrow::Cow;

use glam::{EulerRot, Mat4, Vec3};
use uuid::Uuid;

use crate::scene::transform::Transform;

/// Perspective camera with its own transform.
///
/// Cameras live outside the node graph: the engine owns a primary camera
/// (driven by the orbit controller and the keyframe animator) and an AR
/// camera (driven by raw device orientation).
#[derive(Debug, Clone)]
pub struct Camera {
    pub uuid: Uuid,
    pub name: Cow<'static, str>,
    pub transform: Transform,

    // === 投影属性 ===
    /// Vertical field of view in radians.
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,

    pub(crate) projection_matrix: Mat4,
    projection_updates: u64,
}

impl Camera {
    /// `fov` is the vertical field of view in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            uuid: Uuid::new_v4(),
            name: Cow::Borrowed("Camera"),
            transform: Transform::new(),
            fov: fov.to_radians(),
            aspect,
            near,
            far,
            projection_matrix: Mat4::IDENTITY,
            projection_updates: 0,
        };
        cam.update_projection_matrix();
        cam
    }

    #[must_use]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = Cow::Borrowed(name);
        self
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        self.projection_updates += 1;
    }

    /// Updates the aspect ratio. The projection is only rebuilt when the
    /// value actually changes; returns whether it did.
    pub fn set_aspect(&mut self, aspect: f32) -> bool {
        if !aspect.is_finite() || aspect <= 0.0 || (aspect - self.aspect).abs() <= f32::EPSILON {
            return false;
        }
        self.aspect = aspect;
        self.update_projection_matrix();
        true
    }

    /// Number of times the projection matrix has been rebuilt.
    #[inline]
    #[must_use]
    pub fn projection_updates(&self) -> u64 {
        self.projection_updates
    }

    #[inline]
    #[must_use]
    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    #[inline]
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    #[inline]
    #[must_use]
    pub fn near(&self) -> f32 {
        self.near
    }

    #[inline]
    #[must_use]
    pub fn far(&self) -> f32 {
        self.far
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// XYZ Euler rotation in degrees.
    #[must_use]
    pub fn rotation_degrees(&self) -> Vec3 {
        let (x, y, z) = self.transform.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }

    /// Sets the rotation from XYZ Euler angles in degrees.
    pub fn set_rotation_degrees(&mut self, rotation: Vec3) {
        self.transform.set_rotation_euler(
            rotation.x.to_radians(),
            rotation.y.to_radians(),
            rotation.z.to_radians(),
        );
    }

    /// Normalized view direction.
    #[inline]
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.transform.forward()
    }

    /// Point one unit ahead of the camera along its view direction.
    #[must_use]
    pub fn look_at_point(&self) -> Vec3 {
        self.position() + self.forward()
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.transform.rotation, self.transform.position).inverse()
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    /// Visible `(width, height)` of the view frustum at `distance` units in
    /// front of the camera.
    #[must_use]
    pub fn frustum_size_at(&self, distance: f32) -> (f32, f32) {
        let height = 2.0 * distance * (self.fov * 0.5).tan();
        (height * self.aspect, height)
    }
}
