use glam::{Affine3A, EulerRot, Mat3, Quat, Vec3};

/// TRS snapshot the cached local matrix was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Trs {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
}

/// Transform 组件
///
/// Position, rotation and scale of a scene node. The motion loop writes the
/// TRS fields every frame; the local matrix is rebuilt by
/// [`Scene::update_matrices`](crate::scene::Scene::update_matrices) only when
/// they actually moved.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,
    /// `None` until the first rebuild.
    built_from: Option<Trs>,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
            built_from: None,
        }
    }

    fn trs(&self) -> Trs {
        Trs {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Rebuilds the local matrix if the TRS fields changed. Returns whether it did.
    pub(crate) fn refresh_local_matrix(&mut self) -> bool {
        let current = self.trs();
        if self.built_from == Some(current) {
            return false;
        }
        self.local_matrix = Affine3A::from_scale_rotation_translation(current.scale, current.rotation, current.position);
        self.built_from = Some(current);
        true
    }

    /// Sets the rotation from XYZ Euler angles in radians.
    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    pub fn set_uniform_scale(&mut self, s: f32) {
        self.scale = Vec3::splat(s);
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    /// World matrix as of the last [`Scene::update_matrices`](crate::scene::Scene::update_matrices).
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    /// Local -Z rotated into parent space.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.rotation * Vec3::NEG_Z).normalize_or_zero()
    }

    /// Turns -Z toward `target` (parent space). A target straight along `up`
    /// leaves the rotation as it is.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        let side = forward.cross(up);
        if side.length_squared() < 1e-4 {
            return;
        }
        let right = side.normalize();
        let true_up = right.cross(forward).normalize();
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, true_up, -forward));
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
