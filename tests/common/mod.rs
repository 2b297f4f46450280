//! Shared fixtures: recording backend, in-memory surface host, canned
//! decoders and a scripted video source.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::future::BoxFuture;
use glam::{Vec3, Vec4};

use mirage::assets::{ColorDepth, DecodedMesh, DecodedNode, DecodedPointCloud, MeshDecoder, PointCloudDecoder, TextureDecoder};
use mirage::backend::{RenderBackend, ResourceId, SurfaceHost, SurfaceId};
use mirage::resources::{Geometry, Material, Mesh, MeshMaterial, Texture};
use mirage::scene::{Camera, Scene};
use mirage::sensors::{StreamConstraints, VideoSource};
use mirage::{MirageError, Result};

// ============================================================================
// Render backend / surface host
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Clear,
    Render { meshes: usize, camera: String },
    Release(ResourceId),
    ReleaseRenderLists,
    Resize(u32, u32),
    Dispose,
    ForceContextLoss(SurfaceId),
    RemoveSurface(SurfaceId),
    CreateSurface(u32, u32),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub struct RecordingBackend {
    log: CallLog,
}

impl RenderBackend for RecordingBackend {
    fn clear(&mut self) {
        self.log.borrow_mut().push(Call::Clear);
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) {
        self.log.borrow_mut().push(Call::Render {
            meshes: scene.visible_meshes().count(),
            camera: camera.name.to_string(),
        });
    }

    fn release(&mut self, resource: ResourceId) {
        self.log.borrow_mut().push(Call::Release(resource));
    }

    fn release_render_lists(&mut self) {
        self.log.borrow_mut().push(Call::ReleaseRenderLists);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().push(Call::Resize(width, height));
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().push(Call::Dispose);
    }
}

pub struct MockSurfaceHost {
    pub log: CallLog,
    pub size: (u32, u32),
    pub attached: Rc<RefCell<Vec<SurfaceId>>>,
    pub fail_create: bool,
    next_id: u64,
}

impl MockSurfaceHost {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            size: (800, 600),
            attached: Rc::default(),
            fail_create: false,
            next_id: 1,
        }
    }
}

impl SurfaceHost for MockSurfaceHost {
    fn container_size(&self) -> (u32, u32) {
        self.size
    }

    fn attached_surfaces(&self) -> Vec<SurfaceId> {
        self.attached.borrow().clone()
    }

    fn force_context_loss(&mut self, surface: SurfaceId) {
        self.log.borrow_mut().push(Call::ForceContextLoss(surface));
    }

    fn remove_surface(&mut self, surface: SurfaceId) {
        self.log.borrow_mut().push(Call::RemoveSurface(surface));
        self.attached.borrow_mut().retain(|s| *s != surface);
    }

    fn create_surface(&mut self, width: u32, height: u32) -> Result<(SurfaceId, Box<dyn RenderBackend>)> {
        if self.fail_create {
            return Err(MirageError::RenderContextUnavailable("no adapter".into()));
        }
        self.log.borrow_mut().push(Call::CreateSurface(width, height));
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.attached.borrow_mut().push(id);
        Ok((id, Box::new(RecordingBackend { log: self.log.clone() })))
    }
}

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

// ============================================================================
// Decoders
// ============================================================================

/// Decodes `<name>.ply` to a fixed cloud after a per-name delay.
pub struct CannedPointClouds {
    pub delays: Vec<(&'static str, u64)>,
    pub cloud: DecodedPointCloud,
}

impl CannedPointClouds {
    pub fn new(cloud: DecodedPointCloud) -> Self {
        Self {
            delays: Vec::new(),
            cloud,
        }
    }

    pub fn delay(mut self, name: &'static str, ms: u64) -> Self {
        self.delays.push((name, ms));
        self
    }

    fn delay_for(&self, path: &str) -> u64 {
        self.delays
            .iter()
            .find(|(name, _)| path.ends_with(name))
            .map_or(0, |(_, ms)| *ms)
    }
}

impl PointCloudDecoder for CannedPointClouds {
    fn decode<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<DecodedPointCloud>> {
        Box::pin(async move {
            let ms = self.delay_for(path);
            if ms > 0 {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            if path.contains("broken") {
                return Err(MirageError::DecodeFailure {
                    path: path.to_string(),
                    reason: "truncated header".into(),
                });
            }
            Ok(self.cloud.clone())
        })
    }
}

/// A single textured triangle wrapped in one root node.
pub struct CannedMeshes {
    pub delay_ms: u64,
}

pub fn triangle_mesh() -> Mesh {
    let geometry = Geometry::new("triangle", vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let mut material = MeshMaterial::new("mat", Vec4::ONE);
    material.maps.push(Texture::new(
        "albedo",
        1,
        1,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        vec![255; 4],
    ));
    Mesh::new(geometry, Material::Mesh(material))
}

impl MeshDecoder for CannedMeshes {
    fn decode<'a>(&'a self, _path: &'a str) -> BoxFuture<'a, Result<DecodedMesh>> {
        Box::pin(async move {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            Ok(DecodedMesh {
                roots: vec![DecodedNode::new("Root").with_child(DecodedNode::new("Body").with_mesh(triangle_mesh()))],
            })
        })
    }
}

pub struct CannedTextures;

impl TextureDecoder for CannedTextures {
    fn decode<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Texture>> {
        Box::pin(async move {
            Ok(Texture::new(
                path,
                2,
                1,
                wgpu::TextureFormat::Rgba8UnormSrgb,
                vec![0; 8],
            ))
        })
    }
}

/// Cloud spanning 4 units along X, off-center.
pub fn wide_cloud() -> DecodedPointCloud {
    DecodedPointCloud {
        positions: vec![[1.0, 0.0, 0.0], [5.0, 1.0, 0.0], [3.0, 0.5, 1.0]],
        colors: Some(vec![[255.0, 0.0, 0.0], [0.0, 255.0, 0.0], [0.0, 0.0, 255.0]]),
        color_depth: ColorDepth::U8,
    }
}

// ============================================================================
// Video
// ============================================================================

pub struct ScriptedVideo {
    pub secure: bool,
    /// Results returned by successive `open` calls; `Ok` once exhausted.
    pub open_results: Vec<Result<()>>,
    pub opened: Rc<RefCell<Vec<StreamConstraints>>>,
    pub closed: Rc<RefCell<usize>>,
    pub size: Option<(u32, u32)>,
    is_open: bool,
}

impl ScriptedVideo {
    pub fn new() -> Self {
        Self {
            secure: true,
            open_results: Vec::new(),
            opened: Rc::default(),
            closed: Rc::default(),
            size: Some((1280, 720)),
            is_open: false,
        }
    }
}

impl VideoSource for ScriptedVideo {
    fn is_secure_context(&self) -> bool {
        self.secure
    }

    fn open(&mut self, constraints: &StreamConstraints) -> Result<()> {
        self.opened.borrow_mut().push(*constraints);
        let result = if self.open_results.is_empty() {
            Ok(())
        } else {
            self.open_results.remove(0)
        };
        self.is_open = result.is_ok();
        result
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        if self.is_open { self.size } else { None }
    }

    fn close(&mut self) {
        self.is_open = false;
        *self.closed.borrow_mut() += 1;
    }
}

// ============================================================================
// Logging / float helpers
// ============================================================================

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const EPSILON: f32 = 1e-4;

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

pub fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}
