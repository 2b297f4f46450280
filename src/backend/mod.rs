//! Render Backend Seams
//!
//! The engine never talks to a GPU directly. Hosts plug in two collaborators:
//!
//! - [`SurfaceHost`]: the container that owns rendering surfaces. It lists,
//!   creates and removes them, and can force a surface's context to be lost
//!   so a stale instance releases its GPU memory immediately.
//! - [`RenderBackend`]: the renderer bound to one surface. It draws the
//!   retained [`Scene`] through a [`Camera`] and frees GPU copies of the
//!   resources the engine releases.
//!
//! A wgpu renderer, a WebGL bridge and the recording mock used by the
//! integration tests all sit behind the same two traits.

use uuid::Uuid;

use crate::errors::Result;
use crate::scene::{Camera, Scene};

/// Identifies one rendering surface inside a [`SurfaceHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// A GPU-side resource the backend may hold for a CPU resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Geometry(Uuid),
    Material(Uuid),
    Texture(Uuid),
}

pub trait RenderBackend {
    /// Clears color, depth and stencil of the current target.
    fn clear(&mut self);

    /// Submits one draw of `scene` as seen from `camera`.
    fn render(&mut self, scene: &Scene, camera: &Camera);

    /// Frees the GPU copy of `resource`. Unknown ids are ignored.
    fn release(&mut self, resource: ResourceId);

    /// Drops cached per-frame render lists.
    fn release_render_lists(&mut self);

    /// Reconfigures the drawing buffer to `width` x `height` pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Releases the context itself. The backend is not used afterwards.
    fn dispose(&mut self);
}

pub trait SurfaceHost {
    /// Pixel size of the container the surface fills.
    fn container_size(&self) -> (u32, u32);

    /// Surfaces currently attached to the container, including stale ones
    /// left behind by an earlier instance.
    fn attached_surfaces(&self) -> Vec<SurfaceId>;

    /// Forces the surface's rendering context to be lost.
    fn force_context_loss(&mut self, surface: SurfaceId);

    /// Detaches the surface from the container.
    fn remove_surface(&mut self, surface: SurfaceId);

    /// Creates and attaches a new surface with a backend bound to it.
    ///
    /// Fails with [`MirageError::RenderContextUnavailable`](crate::errors::MirageError::RenderContextUnavailable)
    /// when no context can be created.
    fn create_surface(&mut self, width: u32, height: u32) -> Result<(SurfaceId, Box<dyn RenderBackend>)>;
}
