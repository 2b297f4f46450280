//! Engine Settings
//!
//! Tunables for the motion-fusion loop, the asset loader, the keyframe
//! animator and the AR camera. Every field has a working default, so most
//! hosts only override a handful:
//!
//! ```rust,ignore
//! use mirage::settings::EngineSettings;
//!
//! let settings = EngineSettings {
//!     animation_duration_ms: 8000.0,
//!     ..Default::default()
//! };
//!
//! // Or from a JSON document shipped with the app:
//! let settings = EngineSettings::from_json_str(r#"{ "blend_factor": 0.2 }"#)?;
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Per-frame blend toward the target position (first-order low-pass).
pub const DEFAULT_BLEND_FACTOR: f32 = 0.1;
/// Orientation delta (radians) to positional offset factor in AR mode.
pub const DEFAULT_AR_SENSITIVITY: f32 = 0.05;
/// Largest bounding dimension of a loaded point cloud after normalization.
pub const POINT_CLOUD_TARGET_SIZE: f32 = 2.0;
/// Total keyframe playback length, independent of the pose count.
pub const DEFAULT_ANIMATION_DURATION_MS: f64 = 5000.0;
/// Saved camera pose capacity.
pub const MAX_CAMERA_POSES: usize = 4;

pub const MIN_BRIGHTNESS: f32 = 0.0;
pub const MIN_POINT_SIZE: f32 = 0.1;

/// Primary perspective camera configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 5.0),
        }
    }
}

/// Camera stream request, in the order it is tried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub prefer_rear_camera: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            prefer_rear_camera: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub blend_factor: f32,
    pub ar_sensitivity: f32,
    pub point_cloud_target_size: f32,
    /// Initial `point_size` uniform for point clouds, in pixels.
    pub default_point_size: f32,
    pub animation_duration_ms: f64,
    pub max_camera_poses: usize,
    /// Duration used by [`Engine::ramp_opacity`](crate::Engine::ramp_opacity) when none is given.
    pub opacity_ramp_ms: f64,
    pub camera: CameraSettings,
    pub video: VideoSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            blend_factor: DEFAULT_BLEND_FACTOR,
            ar_sensitivity: DEFAULT_AR_SENSITIVITY,
            point_cloud_target_size: POINT_CLOUD_TARGET_SIZE,
            default_point_size: 1.0,
            animation_duration_ms: DEFAULT_ANIMATION_DURATION_MS,
            max_camera_poses: MAX_CAMERA_POSES,
            opacity_ramp_ms: 1000.0,
            camera: CameraSettings::default(),
            video: VideoSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Parses settings from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
