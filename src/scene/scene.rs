use glam::Affine3A;
use slotmap::SlotMap;

use crate::resources::mesh::Mesh;
use crate::resources::texture::Environment;
use crate::scene::NodeHandle;
use crate::scene::node::Node;

/// Retained-mode scene graph.
///
/// Pure data: node hierarchy, transforms, drawables and the optional
/// background environment. The render backend reads it once per frame;
/// only the engine mutates it.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeHandle, Node>,
    root_nodes: Vec<NodeHandle>,

    /// Background environment map, drawn only while `enabled`.
    pub environment: Option<Environment>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn root_nodes(&self) -> &[NodeHandle] {
        &self.root_nodes
    }

    /// Adds a node at the root of the graph.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn add_to_parent(&mut self, mut child: Node, parent: NodeHandle) -> NodeHandle {
        if !self.nodes.contains_key(parent) {
            log::error!("Parent node not found, adding '{}' at the root", child.name);
            return self.add_node(child);
        }
        child.parent = Some(parent);
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        handle
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// First node (anywhere in the graph) carrying `name`.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find_map(|(handle, node)| (node.name == name).then_some(handle))
    }

    /// Handles of `root` and all its descendants, parents before children.
    #[must_use]
    pub fn subtree(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            out.push(handle);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Calls `f` on every mesh in the subtree rooted at `root`.
    pub fn for_each_mesh_mut(&mut self, root: NodeHandle, mut f: impl FnMut(&mut Mesh)) {
        for handle in self.subtree(root) {
            if let Some(mesh) = self.nodes.get_mut(handle).and_then(|n| n.mesh.as_mut()) {
                f(mesh);
            }
        }
    }

    /// Unlinks `handle` from its parent (or the root list) and removes it and
    /// its descendants from the graph. The removed nodes are returned so the
    /// caller can release their resources.
    pub fn detach(&mut self, handle: NodeHandle) -> Vec<Node> {
        let Some(node) = self.nodes.get(handle) else {
            return Vec::new();
        };

        match node.parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(parent)
                    && let Some(pos) = p.children.iter().position(|&x| x == handle)
                {
                    p.children.remove(pos);
                }
            }
            None => {
                if let Some(pos) = self.root_nodes.iter().position(|&x| x == handle) {
                    self.root_nodes.remove(pos);
                }
            }
        }

        self.subtree(handle)
            .into_iter()
            .filter_map(|h| self.nodes.remove(h))
            .collect()
    }

    /// Removes every node still in the graph and returns them.
    pub fn drain_nodes(&mut self) -> Vec<Node> {
        self.root_nodes.clear();
        self.nodes.drain().map(|(_, node)| node).collect()
    }

    /// Drops all nodes and the environment.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root_nodes.clear();
        self.environment = None;
    }

    /// Propagates local matrices down the hierarchy.
    pub fn update_matrices(&mut self) {
        let roots = self.root_nodes.clone();
        let mut stack: Vec<(NodeHandle, Affine3A, bool)> = roots
            .into_iter()
            .map(|h| (h, Affine3A::IDENTITY, false))
            .collect();

        while let Some((handle, parent_world, parent_changed)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };
            let changed = node.transform.refresh_local_matrix() || parent_changed;
            if changed {
                node.transform.world_matrix = parent_world * node.transform.local_matrix;
            }
            let world = node.transform.world_matrix;
            for &child in &node.children {
                stack.push((child, world, changed));
            }
        }
    }

    /// `true` if the node and all its ancestors are visible.
    #[must_use]
    pub fn is_visible(&self, handle: NodeHandle) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            match self.nodes.get(h) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Iterates visible drawables with their world matrices.
    pub fn visible_meshes(&self) -> impl Iterator<Item = (NodeHandle, &Mesh, &Affine3A)> {
        self.nodes.iter().filter_map(move |(handle, node)| {
            let mesh = node.mesh.as_ref()?;
            self.is_visible(handle)
                .then_some((handle, mesh, &node.transform.world_matrix))
        })
    }
}
