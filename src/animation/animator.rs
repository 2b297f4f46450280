//! Camera Keyframe Animator
//!
//! Plays the saved camera poses back in creation order. The total duration
//! is fixed regardless of how many poses there are, so every segment gets
//! `duration / (n - 1)`. Positions blend linearly; rotations blend along the
//! shorter arc per axis.

use crate::animation::poses::CameraPoseStore;
use crate::animation::tracks::{KeyframeCursor, KeyframeTrack};
use crate::animation::values::{CameraKeyframe, EulerDegrees};
use crate::scene::Camera;

/// Result of advancing the animator by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    /// The camera was moved and playback continues.
    Running,
    /// The camera reached the final pose; the session has ended.
    Finished,
}

#[derive(Debug, Clone)]
struct AnimationSession {
    track: KeyframeTrack<CameraKeyframe>,
    cursor: KeyframeCursor,
    /// Latched on the first update after `start`.
    started_at: Option<f64>,
    progress: f32,
}

#[derive(Debug, Clone)]
pub struct CameraAnimator {
    duration_ms: f64,
    session: Option<AnimationSession>,
}

impl CameraAnimator {
    #[must_use]
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            session: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Progress of the running session in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> Option<f32> {
        self.session.as_ref().map(|s| s.progress)
    }

    /// Current segment index and local progress.
    #[must_use]
    pub fn segment(&self) -> Option<(usize, f32)> {
        self.session
            .as_ref()
            .and_then(|s| s.track.segment_at(s.progress))
    }

    /// Starts (or restarts) playback through every stored pose.
    ///
    /// Needs at least two poses; otherwise logs a warning, leaves any state
    /// untouched and returns `false`.
    pub fn start(&mut self, poses: &CameraPoseStore) -> bool {
        if poses.len() < 2 {
            log::warn!(
                "Camera animation needs at least 2 saved poses, have {}",
                poses.len()
            );
            return false;
        }
        let keys = poses
            .iter()
            .map(|p| CameraKeyframe {
                position: p.position,
                rotation: EulerDegrees(p.rotation),
            })
            .collect();
        self.session = Some(AnimationSession {
            track: KeyframeTrack::evenly_spaced(keys),
            cursor: KeyframeCursor::default(),
            started_at: None,
            progress: 0.0,
        });
        log::info!(
            "Camera animation started over {} poses ({} ms)",
            poses.len(),
            self.duration_ms
        );
        true
    }

    /// Cancels playback. No further update touches the camera.
    pub fn stop(&mut self) {
        if self.session.take().is_some() {
            log::info!("Camera animation stopped");
        }
    }

    /// Moves `camera` to where the animation is at `now_ms`.
    ///
    /// Returns `None` when no session is running.
    pub fn update(&mut self, now_ms: f64, camera: &mut Camera) -> Option<AnimationStatus> {
        let session = self.session.as_mut()?;
        let started_at = *session.started_at.get_or_insert(now_ms);
        let progress = if self.duration_ms > 0.0 {
            ((now_ms - started_at) / self.duration_ms).clamp(0.0, 1.0) as f32
        } else {
            1.0
        };
        session.progress = progress;

        let key = session
            .track
            .sample_with_cursor(progress, &mut session.cursor)?;
        camera.transform.position = key.position;
        camera.set_rotation_degrees(key.rotation.0);

        if progress >= 1.0 {
            self.session = None;
            log::info!("Camera animation finished");
            Some(AnimationStatus::Finished)
        } else {
            Some(AnimationStatus::Running)
        }
    }
}
