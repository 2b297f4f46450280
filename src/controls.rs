//! Pointer-driven camera control seam.

use glam::Vec2;

use crate::scene::Camera;

/// Pointer activity accumulated by the host since the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    /// Drag distance in pixels with the primary button (or one finger).
    pub rotate_drag: Vec2,
    /// Drag distance in pixels with the secondary button (or two fingers).
    pub pan_drag: Vec2,
    /// Wheel or pinch steps; positive zooms in.
    pub zoom: f32,
}

impl PointerInput {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.rotate_drag == Vec2::ZERO && self.pan_drag == Vec2::ZERO && self.zoom == 0.0
    }
}

/// Moves the primary camera in pointer mode.
pub trait CameraController {
    /// Queues pointer activity for the next update.
    fn handle_pointer(&mut self, input: &PointerInput);

    /// Applies queued input (and any damping) to `camera`.
    fn update(&mut self, camera: &mut Camera, viewport: (u32, u32), dt: f32);

    /// Re-derives internal state after something else moved the camera.
    fn sync_from_camera(&mut self, camera: &Camera);

    /// Detaches from input. The controller is dropped afterwards.
    fn dispose(&mut self);
}
