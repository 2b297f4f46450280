use glam::{Vec2, Vec3};

use crate::controls::{CameraController, PointerInput};
use crate::scene::Camera;

/// Spherical orbit around `center`, with damped rotation.
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub min_distance: f32,
    pub max_distance: f32,

    pub center: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,

    rotate_delta: Vec2,
    pending: PointerInput,
    enabled: bool,
}

impl OrbitControls {
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            damping_factor: 0.05,
            enable_damping: true,
            min_distance: 0.1,
            max_distance: 1000.0,

            center,
            radius,
            theta: 0.0,
            phi: std::f32::consts::FRAC_PI_2,

            rotate_delta: Vec2::ZERO,
            pending: PointerInput::default(),
            enabled: true,
        }
    }

    fn spherical_offset(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl CameraController for OrbitControls {
    fn handle_pointer(&mut self, input: &PointerInput) {
        if !self.enabled {
            return;
        }
        self.pending.rotate_drag += input.rotate_drag;
        self.pending.pan_drag += input.pan_drag;
        self.pending.zoom += input.zoom;
    }

    fn update(&mut self, camera: &mut Camera, viewport: (u32, u32), dt: f32) {
        let input = std::mem::take(&mut self.pending);
        let screen_height = (viewport.1 as f32).max(1.0);

        let rotate_per_pixel = 2.0 * std::f32::consts::PI / screen_height;
        self.rotate_delta -= input.rotate_drag * rotate_per_pixel * self.rotate_speed;

        if self.enable_damping {
            let target_fps = 60.0;
            let retention = (1.0 - self.damping_factor).powf(dt * target_fps);
            let delta_apply = self.rotate_delta * (1.0 - retention);
            self.theta += delta_apply.x;
            self.phi += delta_apply.y;
            self.rotate_delta *= retention;
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }

        const EPS: f32 = 0.0001;
        self.phi = self.phi.clamp(EPS, std::f32::consts::PI - EPS);

        if input.zoom != 0.0 {
            let scale = (1.0 - self.zoom_speed).powf(input.zoom.abs());
            if input.zoom > 0.0 {
                self.radius *= scale;
            } else {
                self.radius /= scale;
            }
            self.radius = self.radius.clamp(self.min_distance, self.max_distance);
        }

        if input.pan_drag != Vec2::ZERO {
            let half_fov = camera.fov_degrees().to_radians() / 2.0;
            let target_world_height = 2.0 * self.radius * half_fov.tan();
            let pixels_to_world_ratio = target_world_height / screen_height;

            let forward = -self.spherical_offset();
            let right = forward.cross(Vec3::Y).normalize_or_zero();
            let up = right.cross(forward).normalize_or_zero();

            self.center += (right * -input.pan_drag.x + up * input.pan_drag.y)
                * pixels_to_world_ratio
                * self.pan_speed;
        }

        camera.transform.position = self.center + self.spherical_offset() * self.radius;
        camera.transform.look_at(self.center, Vec3::Y);
    }

    /// Keeps the orbit distance and moves the center in front of the camera,
    /// so the camera keeps looking where it was looking.
    fn sync_from_camera(&mut self, camera: &Camera) {
        let position = camera.position();
        let distance = (position - self.center).length().max(self.min_distance);
        self.center = position + camera.forward() * distance;

        let offset = position - self.center;
        self.radius = offset.length().clamp(self.min_distance, self.max_distance);
        if self.radius > f32::EPSILON {
            self.phi = (offset.y / self.radius).clamp(-1.0, 1.0).acos();
            self.theta = offset.x.atan2(offset.z);
        }
        self.rotate_delta = Vec2::ZERO;
        self.pending = PointerInput::default();
        self.enabled = true;
    }

    fn dispose(&mut self) {
        self.enabled = false;
        self.rotate_delta = Vec2::ZERO;
        self.pending = PointerInput::default();
    }
}
