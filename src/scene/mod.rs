//! Scene graph module
//!
//! - Node: scene node with hierarchy, transform and optional drawable
//! - Transform: position, rotation, scale with cached matrices
//! - Scene: the retained-mode graph the backend draws
//! - Camera: perspective cameras owned by the engine
//! - Registry: the table of loaded objects and their animated state

pub mod camera;
pub mod node;
pub mod registry;
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use node::Node;
pub use registry::{ObjectKind, ObjectRegistry, Registrar, SceneObject};
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
}
