//! Motion Fusion
//!
//! Per-frame math shared by the two input regimes:
//!
//! - **Pointer mode**: objects ease toward their target position and take
//!   their user rotation; the orbit controller drives the camera.
//! - **AR mode**: objects counter-rotate against the device's rotation since
//!   the reference sample and drift slightly in the opposite direction,
//!   while a separate camera follows the raw device orientation.
//!
//! The AR offset is recomputed from the current target every tick, so the
//! object never accumulates drift.

pub mod ramps;

use glam::{EulerRot, Quat, Vec3};

use crate::sensors::{OrientationDelta, OrientationSample};

pub use ramps::{OpacityRamp, OpacityRamps};

/// One first-order low-pass step: `p + (t - p) * blend`.
#[inline]
#[must_use]
pub fn ease_toward(current: Vec3, target: Vec3, blend: f32) -> Vec3 {
    current + (target - current) * blend
}

/// Object rotation (XYZ Euler, radians) that cancels half of the device rotation.
///
/// Pitch drives X, yaw drives Y and roll drives Z.
#[inline]
#[must_use]
pub fn ar_rotation(delta: OrientationDelta) -> Vec3 {
    Vec3::new(-delta.beta, -delta.alpha, -delta.gamma) * 0.5
}

/// Positional offset added to the target in AR mode.
#[inline]
#[must_use]
pub fn ar_offset(delta: OrientationDelta, sensitivity: f32) -> Vec3 {
    Vec3::new(delta.gamma, delta.beta, 0.0) * sensitivity
}

/// Composes a user or AR rotation over an object's base rotation.
#[inline]
#[must_use]
pub fn compose_rotation(euler: Vec3, base: Quat) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z) * base
}

/// Orientation of the AR camera for a raw device sample.
///
/// YXZ order with yaw = alpha, pitch = beta - 90° (the phone held upright
/// looks at the horizon) and roll = gamma.
#[must_use]
pub fn ar_camera_rotation(sample: OrientationSample) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        sample.alpha.to_radians(),
        (sample.beta - 90.0).to_radians(),
        sample.gamma.to_radians(),
    )
}
