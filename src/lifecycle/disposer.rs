//! Resource release helpers used by initialization cleanup and teardown.

use crate::backend::{RenderBackend, ResourceId, SurfaceHost};
use crate::resources::mesh::Mesh;
use crate::scene::{Node, ObjectRegistry, Scene};

/// Releases the geometry, material and texture maps of one drawable.
pub fn release_mesh(backend: &mut dyn RenderBackend, mesh: &Mesh) {
    backend.release(ResourceId::Geometry(mesh.geometry.uuid));
    backend.release(ResourceId::Material(mesh.material.uuid()));
    for map in mesh.material.maps() {
        backend.release(ResourceId::Texture(map.uuid));
    }
}

/// Releases the drawables of already-detached nodes.
pub fn release_nodes(backend: Option<&mut (dyn RenderBackend + 'static)>, nodes: &[Node]) {
    let Some(backend) = backend else {
        return;
    };
    for mesh in nodes.iter().filter_map(|n| n.mesh.as_ref()) {
        release_mesh(backend, mesh);
    }
}

/// Force-releases and removes every surface still attached to the host.
///
/// Returns how many were removed.
pub fn cleanup_stale_surfaces(host: &mut dyn SurfaceHost) -> usize {
    let stale = host.attached_surfaces();
    for &surface in &stale {
        log::debug!("Removing stale surface {surface:?}");
        host.force_context_loss(surface);
        host.remove_surface(surface);
    }
    if !stale.is_empty() {
        log::warn!("Removed {} stale rendering surface(s)", stale.len());
    }
    stale.len()
}

/// Keeps the first registry entry of every name and disposes the others'
/// nodes. Returns how many entries were removed.
pub fn dedupe_registry(
    registry: &mut ObjectRegistry,
    scene: &mut Scene,
    mut backend: Option<&mut (dyn RenderBackend + 'static)>,
) -> usize {
    let removed = registry.dedup_by_name();
    for entry in &removed {
        log::warn!("Disposing duplicate scene object '{}'", entry.name());
        let nodes = scene.detach(entry.node());
        release_nodes(backend.as_deref_mut(), &nodes);
    }
    removed.len()
}

/// Detaches every registered object's node and releases its resources,
/// children included. The registry is left empty.
pub fn dispose_registry(
    registry: &mut ObjectRegistry,
    scene: &mut Scene,
    mut backend: Option<&mut (dyn RenderBackend + 'static)>,
) {
    for entry in registry.drain() {
        log::debug!("Disposing '{}'", entry.name());
        let nodes = scene.detach(entry.node());
        release_nodes(backend.as_deref_mut(), &nodes);
    }
}

/// Releases whatever is left in the scene, including the environment map,
/// and clears it.
pub fn dispose_scene(scene: &mut Scene, mut backend: Option<&mut (dyn RenderBackend + 'static)>) {
    let leftovers = scene.drain_nodes();
    if !leftovers.is_empty() {
        log::debug!("Disposing {} remaining node(s)", leftovers.len());
    }
    release_nodes(backend.as_deref_mut(), &leftovers);

    if let Some(environment) = scene.environment.take()
        && let Some(backend) = backend.as_deref_mut()
    {
        log::debug!("Releasing environment '{}'", environment.texture.name);
        backend.release(ResourceId::Texture(environment.texture.uuid));
    }
    scene.clear();
}
