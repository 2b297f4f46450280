use serde::{Deserialize, Serialize};

use crate::errors::{MirageError, Result};

/// Device orientation in degrees: yaw (`alpha`), pitch (`beta`), roll (`gamma`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationSample {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl OrientationSample {
    #[must_use]
    pub fn new(alpha: f32, beta: f32, gamma: f32) -> Self {
        Self { alpha, beta, gamma }
    }

    fn is_finite(&self) -> bool {
        self.alpha.is_finite() && self.beta.is_finite() && self.gamma.is_finite()
    }
}

/// Acceleration including gravity, in m/s².
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MotionSample {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Live orientation minus the latched reference, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationDelta {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

/// Outcome of the host's sensor permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorAccess {
    Granted,
    Denied,
    /// The device has no orientation sensor.
    Unavailable,
}

/// Turns raw orientation events into a delta from the first sample seen
/// after attaching.
#[derive(Debug, Clone, Default)]
pub struct OrientationSensor {
    attached: bool,
    reference: Option<OrientationSample>,
    current: Option<OrientationSample>,
    acceleration: Option<MotionSample>,
}

impl OrientationSensor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts listening. Attaching an attached sensor keeps its latch.
    pub fn attach(&mut self, access: SensorAccess) -> Result<()> {
        match access {
            SensorAccess::Granted => {
                if !self.attached {
                    self.attached = true;
                    self.reference = None;
                    self.current = None;
                    log::debug!("Orientation sensor attached");
                }
                Ok(())
            }
            SensorAccess::Denied => Err(MirageError::PermissionDenied(
                "device orientation access was refused".into(),
            )),
            SensorAccess::Unavailable => Err(MirageError::SensorUnavailable(
                "no device orientation sensor".into(),
            )),
        }
    }

    /// Stops listening and forgets the latch and the live samples.
    pub fn detach(&mut self) {
        if self.attached {
            log::debug!("Orientation sensor detached");
        }
        *self = Self::default();
    }

    #[inline]
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// `true` once a reference sample has been latched.
    #[inline]
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.reference.is_some()
    }

    /// Feeds one orientation event. The first one after attaching becomes
    /// the reference. Ignored while detached or when a component is missing.
    pub fn handle_orientation(&mut self, sample: OrientationSample) {
        if !self.attached {
            return;
        }
        if !sample.is_finite() {
            log::debug!("Ignoring incomplete orientation sample {sample:?}");
            return;
        }
        if self.reference.is_none() {
            log::info!(
                "Reference orientation latched: alpha {:.1}, beta {:.1}, gamma {:.1}",
                sample.alpha,
                sample.beta,
                sample.gamma
            );
            self.reference = Some(sample);
        }
        self.current = Some(sample);
    }

    pub fn handle_motion(&mut self, sample: MotionSample) {
        if self.attached {
            self.acceleration = Some(sample);
        }
    }

    #[must_use]
    pub fn reference(&self) -> Option<OrientationSample> {
        self.reference
    }

    /// Latest raw orientation sample.
    #[must_use]
    pub fn latest(&self) -> Option<OrientationSample> {
        self.current
    }

    #[must_use]
    pub fn acceleration(&self) -> Option<MotionSample> {
        self.acceleration
    }

    #[must_use]
    pub fn delta(&self) -> Option<OrientationDelta> {
        let (reference, current) = (self.reference?, self.current?);
        Some(OrientationDelta {
            alpha: (current.alpha - reference.alpha).to_radians(),
            beta: (current.beta - reference.beta).to_radians(),
            gamma: (current.gamma - reference.gamma).to_radians(),
        })
    }
}
