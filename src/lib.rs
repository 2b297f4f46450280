#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod backend;
pub mod controls;
pub mod engine;
pub mod errors;
pub mod lifecycle;
pub mod motion;
pub mod resources;
pub mod scene;
pub mod sensors;
pub mod settings;
pub mod telemetry;
pub mod utils;

pub use animation::{AnimationStatus, CameraAnimator, CameraPoseStore, SavedCameraPose};
pub use assets::{AssetKind, AssetLoader, LoadBatch, LoadReport};
pub use backend::{RenderBackend, ResourceId, SurfaceHost, SurfaceId};
pub use controls::{CameraController, PointerInput};
pub use engine::Engine;
pub use errors::{MirageError, Result};
pub use lifecycle::{LifecycleGuard, LifecycleState, LoadTicket, StartTrigger};
pub use resources::{Environment, EnvironmentKind, Geometry, Material, Mesh, MeshMaterial, PointCloudMaterial, Texture};
pub use scene::{Camera, Node, NodeHandle, ObjectKind, ObjectRegistry, Scene, SceneObject};
pub use sensors::{MotionSample, OrientationSample, SensorAccess, VideoSource};
pub use settings::EngineSettings;
pub use telemetry::TelemetrySnapshot;
pub use utils::OrbitControls;
