//! Concurrent Asset Loader
//!
//! Loading runs in two phases so the scene is never touched from inside a
//! decode:
//!
//! 1. [`AssetLoader::load`] classifies every path, starts one decode per
//!    supported path (all in flight at once) and collects the outcomes in
//!    completion order into a [`LoadBatch`]. Nothing here mutates shared
//!    state.
//! 2. [`LoadBatch::register`] applies the outcomes on the caller's timeline:
//!    duplicate guard, point-cloud normalization, node insertion and
//!    registry insertion. It returns a [`LoadReport`].
//!
//! A failing decode only affects its own entry.

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use glam::{EulerRot, Quat};

use crate::assets::decoders::{
    ColorDepth, DecodedAsset, DecodedMesh, DecodedNode, DecodedPointCloud, MeshDecoder, PointCloudDecoder,
    TextureDecoder,
};
use crate::assets::kind::{AssetKind, classify_environment, display_name};
use crate::errors::{MirageError, Result};
use crate::resources::geometry::Geometry;
use crate::resources::material::{Material, PointCloudMaterial};
use crate::resources::mesh::Mesh;
use crate::resources::texture::Environment;
use crate::scene::{Node, NodeHandle, ObjectKind, Registrar, Scene, SceneObject};
use crate::settings::EngineSettings;

/// Dispatches paths to the decoder for their kind.
#[derive(Clone, Default)]
pub struct AssetLoader {
    point_clouds: Option<Arc<dyn PointCloudDecoder>>,
    meshes: Option<Arc<dyn MeshDecoder>>,
    textures: Option<Arc<dyn TextureDecoder>>,
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("point_clouds", &self.point_clouds.is_some())
            .field("meshes", &self.meshes.is_some())
            .field("textures", &self.textures.is_some())
            .finish()
    }
}

impl AssetLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader wired to the built-in decoders, reading files under `root`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_directory(root: impl AsRef<std::path::Path>) -> Self {
        use crate::assets::io::FileAssetReader;
        use crate::assets::loaders::{ImageTextureDecoder, PlyDecoder};

        let reader = FileAssetReader::new(root);
        let loader = Self::new()
            .with_point_cloud_decoder(PlyDecoder::new(reader.clone()))
            .with_texture_decoder(ImageTextureDecoder::new(reader.clone()));
        #[cfg(feature = "gltf")]
        let loader = loader.with_mesh_decoder(crate::assets::loaders::GltfDecoder::new(reader));
        loader
    }

    #[must_use]
    pub fn with_point_cloud_decoder(mut self, decoder: impl PointCloudDecoder + 'static) -> Self {
        self.point_clouds = Some(Arc::new(decoder));
        self
    }

    #[must_use]
    pub fn with_mesh_decoder(mut self, decoder: impl MeshDecoder + 'static) -> Self {
        self.meshes = Some(Arc::new(decoder));
        self
    }

    #[must_use]
    pub fn with_texture_decoder(mut self, decoder: impl TextureDecoder + 'static) -> Self {
        self.textures = Some(Arc::new(decoder));
        self
    }

    /// Decodes every supported path concurrently, plus the optional
    /// background environment. Resolves once all of them have settled.
    pub async fn load<S: AsRef<str>>(&self, paths: &[S], environment: Option<&str>) -> LoadBatch {
        let mut rejected = Vec::new();
        let pending = FuturesUnordered::new();

        for path in paths {
            let path = path.as_ref();
            match AssetKind::classify(path) {
                Ok(kind) => pending.push(self.decode_one(kind, path.to_string())),
                Err(err) => {
                    log::error!("{err}");
                    rejected.push(err);
                }
            }
        }

        log::info!(
            "Loading {} asset(s), {} rejected",
            pending.len(),
            rejected.len()
        );

        let environment_fut = async {
            match environment {
                Some(path) => Some(self.decode_environment(path).await),
                None => None,
            }
        };
        let (decoded, environment) =
            futures::join!(pending.collect::<Vec<DecodeResult>>(), environment_fut);

        LoadBatch {
            rejected,
            decoded,
            environment,
        }
    }

    async fn decode_one(&self, kind: AssetKind, path: String) -> DecodeResult {
        let outcome = match kind {
            AssetKind::PointCloud => match &self.point_clouds {
                Some(decoder) => decoder.decode(&path).await.map(DecodedAsset::PointCloud),
                None => Err(no_decoder("point cloud")),
            },
            AssetKind::Mesh => match &self.meshes {
                Some(decoder) => decoder.decode(&path).await.map(DecodedAsset::Mesh),
                None => Err(no_decoder("mesh")),
            },
        };
        let outcome = outcome.map_err(|err| as_decode_failure(&path, err));
        if let Err(err) = &outcome {
            log::error!("{err}");
        }
        DecodeResult {
            name: display_name(&path).to_string(),
            path,
            outcome,
        }
    }

    async fn decode_environment(&self, path: &str) -> Result<Environment> {
        let kind = classify_environment(path)?;
        let decoder = self
            .textures
            .as_ref()
            .ok_or_else(|| as_decode_failure(path, no_decoder("texture")))?;
        let texture = decoder
            .decode(path)
            .await
            .map_err(|err| as_decode_failure(path, err))?;
        Ok(Environment::new(kind, texture))
    }
}

fn no_decoder(kind: &str) -> MirageError {
    MirageError::DecodeFailure {
        path: String::new(),
        reason: format!("no {kind} decoder configured"),
    }
}

fn as_decode_failure(path: &str, err: MirageError) -> MirageError {
    match err {
        MirageError::DecodeFailure { reason, .. } => MirageError::DecodeFailure {
            path: path.to_string(),
            reason,
        },
        MirageError::UnsupportedAsset { .. } => err,
        other => MirageError::DecodeFailure {
            path: path.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Outcome of one decode.
#[derive(Debug)]
pub struct DecodeResult {
    pub path: String,
    /// Registry name: the path's final segment.
    pub name: String,
    pub outcome: Result<DecodedAsset>,
}

/// Everything one [`AssetLoader::load`] call produced.
#[derive(Debug, Default)]
pub struct LoadBatch {
    /// Paths refused before loading began.
    pub rejected: Vec<MirageError>,
    /// Decode outcomes in completion order.
    pub decoded: Vec<DecodeResult>,
    pub environment: Option<Result<Environment>>,
}

/// What [`LoadBatch::register`] did.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Names registered, in completion order.
    pub registered: Vec<String>,
    /// Inert duplicates ([`MirageError::DuplicateAsset`]).
    pub warnings: Vec<MirageError>,
    /// Rejected paths and failed decodes.
    pub errors: Vec<MirageError>,
    pub environment_loaded: bool,
}

impl LoadReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

impl LoadBatch {
    /// Applies the batch to `scene` and the registry, in completion order.
    pub fn register(self, scene: &mut Scene, registrar: &mut Registrar<'_>, settings: &EngineSettings) -> LoadReport {
        let mut report = LoadReport {
            errors: self.rejected,
            ..Default::default()
        };

        for result in self.decoded {
            let asset = match result.outcome {
                Ok(asset) => asset,
                Err(err) => {
                    report.errors.push(err);
                    continue;
                }
            };

            if scene.find_by_name(&result.name).is_some() || registrar.contains(&result.name) {
                let warning = MirageError::DuplicateAsset(result.name);
                log::warn!("{warning}");
                report.warnings.push(warning);
                continue;
            }

            let (handle, kind, base_rotation) = match asset {
                DecodedAsset::PointCloud(cloud) => {
                    let (node, base) = build_point_cloud(&result.name, cloud, settings);
                    (scene.add_node(node), ObjectKind::PointCloud, base)
                }
                DecodedAsset::Mesh(mesh) => {
                    (insert_mesh(scene, &result.name, mesh), ObjectKind::Mesh, Quat::IDENTITY)
                }
            };

            match registrar.insert(SceneObject::new(result.name.clone(), handle, kind, base_rotation)) {
                Ok(()) => {
                    log::info!("Loaded '{}' ({kind:?})", result.name);
                    report.registered.push(result.name);
                }
                Err(entry) => {
                    scene.detach(entry.node());
                    let warning = MirageError::DuplicateAsset(result.name);
                    log::warn!("{warning}");
                    report.warnings.push(warning);
                }
            }
        }

        match self.environment {
            Some(Ok(environment)) => {
                log::info!("Loaded environment '{}'", environment.texture.name);
                scene.environment = Some(environment);
                report.environment_loaded = true;
            }
            Some(Err(err)) => {
                log::error!("{err}");
                report.errors.push(err);
            }
            None => {}
        }

        report
    }
}

/// Fixed reorientation of loaded point clouds: +90° about X, +180° about Z.
#[must_use]
pub fn point_cloud_base_rotation() -> Quat {
    Quat::from_euler(EulerRot::XYZ, FRAC_PI_2, 0.0, PI)
}

/// Brings colors into `[0, 1]` by dividing by the declared channel range.
///
/// Missing or mismatched buffers become white.
#[must_use]
pub fn normalize_colors(colors: Option<Vec<[f32; 3]>>, depth: ColorDepth, count: usize) -> Vec<[f32; 3]> {
    match colors {
        Some(mut colors) if colors.len() == count => {
            let full = depth.full_scale();
            for c in &mut colors {
                *c = c.map(|v| (v / full).clamp(0.0, 1.0));
            }
            colors
        }
        Some(colors) => {
            log::warn!(
                "Color buffer has {} entries for {count} points, using white",
                colors.len()
            );
            vec![[1.0; 3]; count]
        }
        None => vec![[1.0; 3]; count],
    }
}

/// Builds the point-primitive node for a decoded cloud.
///
/// The geometry is recentered at the origin and the node scaled so the
/// largest bounding dimension equals `settings.point_cloud_target_size`.
/// Returns the node and the base rotation applied to it.
#[must_use]
pub fn build_point_cloud(name: &str, cloud: DecodedPointCloud, settings: &EngineSettings) -> (Node, Quat) {
    let count = cloud.positions.len();
    let colors = normalize_colors(cloud.colors, cloud.color_depth, count);
    let mut geometry = Geometry::new(name, cloud.positions).with_colors(colors);

    let scale = match geometry.compute_bounding_box() {
        Some(bbox) => {
            geometry.center();
            let max_dim = bbox.max_dimension();
            if max_dim > f32::EPSILON {
                settings.point_cloud_target_size / max_dim
            } else {
                1.0
            }
        }
        None => 1.0,
    };

    let material = PointCloudMaterial::new(settings.default_point_size);
    let base = point_cloud_base_rotation();
    let mut node = Node::new(name).with_mesh(Mesh::new(geometry, Material::PointCloud(material)));
    node.transform.set_uniform_scale(scale);
    node.transform.rotation = base;
    (node, base)
}

/// Inserts a decoded container under a group node named `name`, at the origin.
pub fn insert_mesh(scene: &mut Scene, name: &str, mesh: DecodedMesh) -> NodeHandle {
    let root = scene.add_node(Node::new(name));
    for child in mesh.roots {
        insert_decoded_node(scene, child, root);
    }
    root
}

fn insert_decoded_node(scene: &mut Scene, decoded: DecodedNode, parent: NodeHandle) {
    let mut node = Node::new(decoded.name);
    node.transform.position = decoded.translation;
    node.transform.rotation = decoded.rotation;
    node.transform.scale = decoded.scale;
    node.mesh = decoded.mesh;
    let handle = scene.add_to_parent(node, parent);
    for child in decoded.children {
        insert_decoded_node(scene, child, handle);
    }
}
