//! Scene Object Registry
//!
//! The owned table of loaded objects and their animated state. Two roles
//! touch it:
//!
//! - the loader, through [`Registrar`], which can only insert new entries;
//! - the frame loop and control callbacks, which mutate the animated fields
//!   (`target_position`, `rotation`, `opacity`, `visible`) of existing
//!   entries.
//!
//! Entry identity (name, node, kind) is fixed at insertion and exposed
//! read-only.

use glam::{Quat, Vec3};

use crate::scene::NodeHandle;

/// Closed set of asset kinds, decided once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Point primitive with the custom point-cloud material.
    PointCloud,
    /// Decoded mesh container with its native materials.
    Mesh,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    name: String,
    node: NodeHandle,
    kind: ObjectKind,
    base_rotation: Quat,

    /// Desired position; the node position chases it every frame.
    pub target_position: Vec3,
    /// User-authored XYZ Euler rotation in radians (non-AR mode).
    pub rotation: Vec3,
    /// Always within `[0, 1]` when written through the engine.
    pub opacity: f32,
    pub visible: bool,
}

impl SceneObject {
    #[must_use]
    pub fn new(name: impl Into<String>, node: NodeHandle, kind: ObjectKind, base_rotation: Quat) -> Self {
        Self {
            name: name.into(),
            node,
            kind,
            base_rotation,
            target_position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            opacity: 1.0,
            visible: true,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Fixed reorientation applied under every animated rotation.
    #[inline]
    #[must_use]
    pub fn base_rotation(&self) -> Quat {
        self.base_rotation
    }
}

#[derive(Debug, Default)]
pub struct ObjectRegistry {
    entries: Vec<SceneObject>,
}

impl ObjectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.entries.iter()
    }

    /// Insert-only view handed to the loader.
    pub fn registrar(&mut self) -> Registrar<'_> {
        Registrar { registry: self }
    }

    /// Keeps the first entry of every name and returns the others.
    pub fn dedup_by_name(&mut self) -> Vec<SceneObject> {
        let mut seen = rustc_hash::FxHashSet::default();
        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| seen.insert(e.name.clone()));
        self.entries = kept;
        removed
    }

    /// Removes and returns every entry, in insertion order.
    pub fn drain(&mut self) -> Vec<SceneObject> {
        std::mem::take(&mut self.entries)
    }

    #[cfg(test)]
    pub(crate) fn push_unchecked(&mut self, entry: SceneObject) {
        self.entries.push(entry);
    }
}

/// Insert-only access to an [`ObjectRegistry`].
pub struct Registrar<'a> {
    registry: &'a mut ObjectRegistry,
}

impl Registrar<'_> {
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Adds `entry` unless its name is taken; a rejected entry is handed back.
    pub fn insert(&mut self, entry: SceneObject) -> Result<(), SceneObject> {
        if self.registry.contains(&entry.name) {
            return Err(entry);
        }
        self.registry.entries.push(entry);
        Ok(())
    }
}
