use glam::Vec3;

/// Values a [`KeyframeTrack`](crate::animation::tracks::KeyframeTrack) can blend.
pub trait Interpolatable: Copy + Sized {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

/// Wraps an angle in degrees into `[-180, 180]`.
#[inline]
#[must_use]
pub fn normalize_degrees(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a < -180.0 {
        a += 360.0;
    }
    a
}

/// Blends two angles (degrees) along the shorter arc.
///
/// Both ends are normalized first, the signed difference is wrapped into
/// `[-180, 180]`, and the result is normalized again.
#[must_use]
pub fn lerp_angle_degrees(start: f32, end: f32, t: f32) -> f32 {
    let from = normalize_degrees(start);
    let to = normalize_degrees(end);
    let diff = normalize_degrees(to - from);
    normalize_degrees(from + diff * t)
}

/// XYZ Euler rotation in degrees, blended per axis along the shorter arc.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerDegrees(pub Vec3);

impl Interpolatable for EulerDegrees {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        Self(Vec3::new(
            lerp_angle_degrees(start.0.x, end.0.x, t),
            lerp_angle_degrees(start.0.y, end.0.y, t),
            lerp_angle_degrees(start.0.z, end.0.z, t),
        ))
    }
}

/// Camera position plus orientation, as stored in a saved pose.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraKeyframe {
    pub position: Vec3,
    pub rotation: EulerDegrees,
}

impl Interpolatable for CameraKeyframe {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        Self {
            position: Vec3::interpolate_linear(start.position, end.position, t),
            rotation: EulerDegrees::interpolate_linear(start.rotation, end.rotation, t),
        }
    }
}
