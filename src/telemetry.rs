//! Per-frame telemetry for overlays and debugging panels.
//!
//! The engine builds one [`TelemetrySnapshot`] per rendered frame. Hosts
//! either read the last one with [`Engine::telemetry`](crate::Engine::telemetry)
//! or subscribe to the channel, which only ever holds the newest snapshot.

use glam::{EulerRot, Quat, Vec3};
use serde::Serialize;

use crate::scene::Camera;
use crate::sensors::MotionSample;

/// Rounds to 2 decimals (positions).
#[inline]
#[must_use]
pub fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Rounds to 1 decimal (angles).
#[inline]
#[must_use]
pub fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

fn position_array(v: Vec3) -> [f32; 3] {
    [round2(v.x), round2(v.y), round2(v.z)]
}

fn degrees_array(q: Quat) -> [f32; 3] {
    let (x, y, z) = q.to_euler(EulerRot::XYZ);
    [
        round1(x.to_degrees()),
        round1(y.to_degrees()),
        round1(z.to_degrees()),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraTelemetry {
    pub position: [f32; 3],
    /// XYZ Euler, degrees.
    pub rotation: [f32; 3],
    /// Position plus the normalized view direction.
    pub look_at: [f32; 3],
}

impl CameraTelemetry {
    #[must_use]
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            position: position_array(camera.position()),
            rotation: degrees_array(camera.transform.rotation),
            look_at: position_array(camera.look_at_point()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectTelemetry {
    pub name: String,
    pub position: [f32; 3],
    /// XYZ Euler of the node, degrees.
    pub rotation: [f32; 3],
    pub opacity: f32,
    pub visible: bool,
}

impl ObjectTelemetry {
    #[must_use]
    pub fn new(name: &str, position: Vec3, rotation: Quat, opacity: f32, visible: bool) -> Self {
        Self {
            name: name.to_string(),
            position: position_array(position),
            rotation: degrees_array(rotation),
            opacity,
            visible,
        }
    }
}

/// Drawing-buffer size and the frustum slice through the world origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewportTelemetry {
    pub width: u32,
    pub height: u32,
    /// Vertical, degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Camera distance from the origin.
    pub distance: f32,
    pub frustum_width: f32,
    pub frustum_height: f32,
    pub frustum_area: f32,
}

impl ViewportTelemetry {
    #[must_use]
    pub fn new(camera: &Camera, (width, height): (u32, u32)) -> Self {
        let distance = camera.position().length();
        let (frustum_width, frustum_height) = camera.frustum_size_at(distance);
        Self {
            width,
            height,
            fov: camera.fov_degrees(),
            near: camera.near(),
            far: camera.far(),
            distance: round2(distance),
            frustum_width: round2(frustum_width),
            frustum_height: round2(frustum_height),
            frustum_area: round2(frustum_width * frustum_height),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub timestamp_ms: f64,
    pub camera: CameraTelemetry,
    pub objects: Vec<ObjectTelemetry>,
    pub viewport: ViewportTelemetry,
    pub ar_active: bool,
    pub acceleration: Option<MotionSample>,
    pub fps: f32,
}

impl TelemetrySnapshot {
    pub fn to_json(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Latest-wins broadcast of snapshots.
#[derive(Debug)]
pub struct TelemetryPublisher {
    tx: flume::Sender<TelemetrySnapshot>,
    rx: flume::Receiver<TelemetrySnapshot>,
    latest: Option<TelemetrySnapshot>,
}

impl Default for TelemetryPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryPublisher {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::bounded(1);
        Self { tx, rx, latest: None }
    }

    /// A receiver that observes the newest unread snapshot.
    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<TelemetrySnapshot> {
        self.rx.clone()
    }

    /// Replaces any unread snapshot with `snapshot`.
    pub fn publish(&mut self, snapshot: TelemetrySnapshot) {
        for _stale in self.rx.try_iter() {}
        if let Err(flume::TrySendError::Full(_)) = self.tx.try_send(snapshot.clone()) {
            log::debug!("Telemetry channel full, snapshot dropped");
        }
        self.latest = Some(snapshot);
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TelemetrySnapshot> {
        self.latest.as_ref()
    }

    pub fn clear(&mut self) {
        for _stale in self.rx.try_iter() {}
        self.latest = None;
    }
}
