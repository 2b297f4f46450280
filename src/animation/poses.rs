use glam::Vec3;
use serde::Serialize;

use crate::errors::{MirageError, Result};
use crate::scene::Camera;

/// A camera placement captured by the user.
///
/// Immutable once stored; the store only hands out shared references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedCameraPose {
    /// Unique, increasing in creation order. Never reused.
    pub id: u32,
    pub name: String,
    pub position: Vec3,
    /// XYZ Euler rotation in degrees.
    pub rotation: Vec3,
    pub look_at: Vec3,
}

/// Bounded, in-memory list of saved camera poses.
#[derive(Debug, Clone)]
pub struct CameraPoseStore {
    poses: Vec<SavedCameraPose>,
    next_id: u32,
    capacity: usize,
}

impl CameraPoseStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            poses: Vec::with_capacity(capacity),
            next_id: 1,
            capacity,
        }
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Saves the current placement of `camera`. Without a name the pose is
    /// called `Camera <id>`.
    pub fn capture(&mut self, name: Option<&str>, camera: &Camera) -> Result<&SavedCameraPose> {
        if self.poses.len() >= self.capacity {
            return Err(MirageError::PoseLimitReached(self.capacity));
        }
        let id = self.next_id;
        self.next_id += 1;
        let pose = SavedCameraPose {
            id,
            name: name.map_or_else(|| format!("Camera {id}"), str::to_string),
            position: camera.position(),
            rotation: camera.rotation_degrees(),
            look_at: camera.look_at_point(),
        };
        log::info!("Saved camera pose {id} '{}'", pose.name);
        self.poses.push(pose);
        Ok(&self.poses[self.poses.len() - 1])
    }

    pub fn remove(&mut self, id: u32) -> Result<SavedCameraPose> {
        let index = self
            .poses
            .iter()
            .position(|p| p.id == id)
            .ok_or(MirageError::PoseNotFound(id))?;
        Ok(self.poses.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&SavedCameraPose> {
        self.poses.iter().find(|p| p.id == id)
    }

    /// Poses in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &SavedCameraPose> {
        self.poses.iter()
    }

    pub fn clear(&mut self) {
        self.poses.clear();
    }
}
