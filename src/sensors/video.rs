//! Live camera feed acquisition.

use crate::errors::{MirageError, Result};
use crate::settings::VideoSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// Rear camera.
    Environment,
    /// Front camera.
    User,
    Any,
}

/// What the engine asks the video source for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: CameraFacing,
    pub ideal_width: Option<u32>,
    pub ideal_height: Option<u32>,
}

impl StreamConstraints {
    /// First request: preferred camera at the configured resolution.
    #[must_use]
    pub fn ideal(settings: &VideoSettings) -> Self {
        Self {
            facing: if settings.prefer_rear_camera {
                CameraFacing::Environment
            } else {
                CameraFacing::User
            },
            ideal_width: Some(settings.ideal_width),
            ideal_height: Some(settings.ideal_height),
        }
    }

    /// Fallback request: any camera, any resolution.
    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            facing: CameraFacing::Any,
            ideal_width: None,
            ideal_height: None,
        }
    }
}

/// Host-provided camera stream.
pub trait VideoSource {
    /// Camera and sensor APIs are only exposed to secure origins.
    fn is_secure_context(&self) -> bool;

    /// Opens the stream. Fails with [`MirageError::PermissionDenied`],
    /// [`MirageError::CameraUnavailable`] (constraints not satisfiable or
    /// device busy) or [`MirageError::SensorUnavailable`] (no camera).
    fn open(&mut self, constraints: &StreamConstraints) -> Result<()>;

    /// Pixel size of the decoded frames, once the stream is ready.
    fn frame_size(&self) -> Option<(u32, u32)>;

    fn close(&mut self);
}

/// Opens `source` with the ideal constraints, retrying once with relaxed
/// constraints on a permission or constraint failure.
///
/// Returns the constraints that succeeded.
pub fn acquire_stream(source: &mut dyn VideoSource, settings: &VideoSettings) -> Result<StreamConstraints> {
    if !source.is_secure_context() {
        return Err(MirageError::InsecureContext);
    }

    let ideal = StreamConstraints::ideal(settings);
    match source.open(&ideal) {
        Ok(()) => Ok(ideal),
        Err(err @ (MirageError::PermissionDenied(_) | MirageError::CameraUnavailable(_))) => {
            log::warn!("{err}; retrying with relaxed constraints");
            let relaxed = StreamConstraints::relaxed();
            source.open(&relaxed)?;
            Ok(relaxed)
        }
        Err(err) => Err(err),
    }
}
