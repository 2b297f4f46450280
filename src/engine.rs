//! Engine Core Module
//!
//! [`Engine`] owns one scene instance end to end: the lifecycle guard, the
//! render surface and backend, the object registry, both cameras, the
//! sensor adapter, the keyframe animator and the telemetry channel. It has
//! no window or event-loop logic; hosts drive it with plain calls:
//!
//! - [`Engine::begin_initialize`] / [`Engine::complete_initialize`] (or
//!   [`Engine::initialize`]) to bring a scene up,
//! - [`Engine::frame`] once per display refresh,
//! - the control surface (`set_*`, pose and animation calls, AR start/stop)
//!   from UI callbacks,
//! - [`Engine::teardown`] to release everything.
//!
//! # Example
//!
//! ```rust,ignore
//! use mirage::{AssetLoader, Engine, EngineSettings, StartTrigger};
//!
//! let mut engine = Engine::new(EngineSettings::default(), surface_host);
//! let loader = AssetLoader::from_directory("assets");
//!
//! let report = engine
//!     .initialize(StartTrigger::Explicit, &loader, &["bunny.ply", "duck.glb"], None)
//!     .await?;
//!
//! // Per display refresh:
//! engine.frame(now_ms);
//! ```

use glam::Vec3;

use crate::animation::{AnimationStatus, CameraAnimator, CameraPoseStore, SavedCameraPose};
use crate::assets::{AssetLoader, LoadBatch, LoadReport};
use crate::backend::{RenderBackend, SurfaceHost, SurfaceId};
use crate::controls::{CameraController, PointerInput};
use crate::errors::{MirageError, Result};
use crate::lifecycle::disposer;
use crate::lifecycle::{LifecycleGuard, LifecycleState, LoadTicket, StartTrigger};
use crate::motion::{self, OpacityRamp, OpacityRamps};
use crate::resources::material::Material;
use crate::scene::{Camera, ObjectKind, ObjectRegistry, Scene, SceneObject};
use crate::sensors::{MotionSample, OrientationSample, OrientationSensor, SensorAccess, VideoSource, acquire_stream};
use crate::settings::EngineSettings;
use crate::telemetry::{
    CameraTelemetry, ObjectTelemetry, TelemetryPublisher, TelemetrySnapshot, ViewportTelemetry,
};
use crate::utils::{FpsCounter, FrameClock, OrbitControls};

type ControllerFactory = Box<dyn Fn(&Camera) -> Box<dyn CameraController>>;

/// Scene lifecycle and motion-fusion controller.
///
/// # Lifecycle
///
/// 1. Create with [`Engine::new`], optionally adding a video source and a
///    custom controller factory.
/// 2. [`begin_initialize`](Self::begin_initialize), await
///    [`AssetLoader::load`], then [`complete_initialize`](Self::complete_initialize).
/// 3. Call [`frame`](Self::frame) every display refresh.
/// 4. [`teardown`](Self::teardown) releases the scene; the engine can be
///    initialized again afterwards.
pub struct Engine {
    settings: EngineSettings,
    lifecycle: LifecycleGuard,

    surfaces: Box<dyn SurfaceHost>,
    surface: Option<SurfaceId>,
    backend: Option<Box<dyn RenderBackend>>,
    viewport: (u32, u32),

    scene: Scene,
    registry: ObjectRegistry,

    camera: Camera,
    ar_camera: Camera,
    controller: Option<Box<dyn CameraController>>,
    controller_factory: ControllerFactory,

    sensor: OrientationSensor,
    video: Option<Box<dyn VideoSource>>,
    ar_active: bool,

    poses: CameraPoseStore,
    animator: CameraAnimator,
    ramps: OpacityRamps,

    clock: FrameClock,
    fps: FpsCounter,
    telemetry: TelemetryPublisher,
    listening_for_resize: bool,
}

impl Engine {
    /// Creates an idle engine. No surface or GPU context exists until
    /// [`begin_initialize`](Self::begin_initialize).
    #[must_use]
    pub fn new(settings: EngineSettings, surfaces: impl SurfaceHost + 'static) -> Self {
        let viewport = surfaces.container_size();
        let camera = primary_camera(&settings, viewport);
        let ar_camera = ar_camera(&settings, viewport);
        Self {
            poses: CameraPoseStore::new(settings.max_camera_poses),
            animator: CameraAnimator::new(settings.animation_duration_ms),
            settings,
            lifecycle: LifecycleGuard::new(),

            surfaces: Box::new(surfaces),
            surface: None,
            backend: None,
            viewport,

            scene: Scene::new(),
            registry: ObjectRegistry::new(),

            camera,
            ar_camera,
            controller: None,
            controller_factory: Box::new(default_controller),

            sensor: OrientationSensor::new(),
            video: None,
            ar_active: false,

            ramps: OpacityRamps::new(),

            clock: FrameClock::new(),
            fps: FpsCounter::new(),
            telemetry: TelemetryPublisher::new(),
            listening_for_resize: false,
        }
    }

    /// Camera feed used in AR mode.
    #[must_use]
    pub fn with_video_source(mut self, video: impl VideoSource + 'static) -> Self {
        self.video = Some(Box::new(video));
        self
    }

    /// Replaces the default [`OrbitControls`]. The factory runs on every
    /// initialization with the freshly reset primary camera.
    #[must_use]
    pub fn with_controller_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Camera) -> Box<dyn CameraController> + 'static,
    {
        self.controller_factory = Box::new(factory);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    #[inline]
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.lifecycle.has_started()
    }

    #[inline]
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    #[must_use]
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.registry.get(name)
    }

    /// Primary (pointer-mode) camera.
    #[inline]
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    #[must_use]
    pub fn ar_camera(&self) -> &Camera {
        &self.ar_camera
    }

    /// Camera the next frame will render through.
    #[must_use]
    pub fn active_camera(&self) -> &Camera {
        if self.is_ar_tracking() {
            &self.ar_camera
        } else {
            &self.camera
        }
    }

    #[inline]
    #[must_use]
    pub fn is_ar_active(&self) -> bool {
        self.ar_active
    }

    /// AR mode is on and a reference orientation has been latched.
    #[must_use]
    pub fn is_ar_tracking(&self) -> bool {
        self.ar_active && self.sensor.is_tracking()
    }

    #[inline]
    #[must_use]
    pub fn sensor(&self) -> &OrientationSensor {
        &self.sensor
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    #[inline]
    #[must_use]
    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    #[inline]
    #[must_use]
    pub fn camera_animation_active(&self) -> bool {
        self.animator.is_active()
    }

    #[inline]
    #[must_use]
    pub fn camera_animation_progress(&self) -> Option<f32> {
        self.animator.progress()
    }

    pub fn camera_poses(&self) -> impl Iterator<Item = &SavedCameraPose> {
        self.poses.iter()
    }

    #[inline]
    #[must_use]
    pub fn opacity_ramps(&self) -> &OpacityRamps {
        &self.ramps
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Starts an initialization: guard check, stale-surface cleanup,
    /// registry dedupe, then surface and backend creation.
    ///
    /// The returned ticket must be handed to
    /// [`complete_initialize`](Self::complete_initialize) with the load batch.
    /// If no render context can be created the guard stays `Idle`.
    pub fn begin_initialize(&mut self, trigger: StartTrigger) -> Result<LoadTicket> {
        let ticket = self.lifecycle.begin(trigger).inspect_err(|err| {
            log::warn!("Initialization refused: {err}");
        })?;
        log::info!("Initializing scene ({trigger:?})");

        disposer::cleanup_stale_surfaces(self.surfaces.as_mut());
        disposer::dedupe_registry(&mut self.registry, &mut self.scene, self.backend.as_deref_mut());

        self.viewport = self.surfaces.container_size();
        let (width, height) = self.viewport;
        let (surface, backend) = match self.surfaces.create_surface(width, height) {
            Ok(created) => created,
            Err(err) => {
                self.lifecycle.abort();
                let err = match err {
                    MirageError::RenderContextUnavailable(_) => err,
                    other => MirageError::RenderContextUnavailable(other.to_string()),
                };
                log::error!("{err}");
                return Err(err);
            }
        };
        self.surface = Some(surface);
        self.backend = Some(backend);

        self.camera = primary_camera(&self.settings, self.viewport);
        self.ar_camera = ar_camera(&self.settings, self.viewport);
        self.controller = Some((self.controller_factory)(&self.camera));
        self.listening_for_resize = true;

        Ok(ticket)
    }

    /// Applies a finished load batch and activates the frame loop.
    ///
    /// Returns `None` (and changes nothing) when `ticket` is stale, i.e. a
    /// teardown happened while the batch was loading.
    pub fn complete_initialize(&mut self, ticket: LoadTicket, batch: LoadBatch) -> Option<LoadReport> {
        if !self.lifecycle.is_current(ticket) {
            log::warn!(
                "Discarding load batch of stale initialization (generation {})",
                ticket.generation()
            );
            return None;
        }

        let report = batch.register(&mut self.scene, &mut self.registry.registrar(), &self.settings);
        self.lifecycle.activate(ticket);
        self.clock.reset();
        self.fps.reset();
        log::info!(
            "Scene active: {} object(s), {} error(s), {} warning(s)",
            self.registry.len(),
            report.errors.len(),
            report.warnings.len()
        );
        Some(report)
    }

    /// [`begin_initialize`](Self::begin_initialize), load, then
    /// [`complete_initialize`](Self::complete_initialize).
    pub async fn initialize<S: AsRef<str>>(
        &mut self,
        trigger: StartTrigger,
        loader: &AssetLoader,
        paths: &[S],
        environment: Option<&str>,
    ) -> Result<LoadReport> {
        let ticket = self.begin_initialize(trigger)?;
        let batch = loader.load(paths, environment).await;
        self.complete_initialize(ticket, batch)
            .ok_or(MirageError::NotActive)
    }

    /// Releases the whole scene instance and returns to `Idle`.
    ///
    /// Safe to call in any state, including while a load is in flight; that
    /// load's batch will be discarded.
    pub fn teardown(&mut self) {
        if self.lifecycle.state() == LifecycleState::Idle && self.backend.is_none() {
            return;
        }
        log::info!("Tearing down scene");

        log::debug!("Teardown: cancelling frame loop, camera animation and opacity ramps");
        self.lifecycle.teardown();
        self.animator.stop();
        self.ramps.clear();

        log::debug!("Teardown: detaching listeners");
        self.listening_for_resize = false;
        self.stop_ar();

        log::debug!("Teardown: disposing camera controller");
        if let Some(mut controller) = self.controller.take() {
            controller.dispose();
        }

        log::debug!("Teardown: releasing scene objects");
        disposer::dispose_registry(&mut self.registry, &mut self.scene, self.backend.as_deref_mut());
        disposer::dispose_scene(&mut self.scene, self.backend.as_deref_mut());

        log::debug!("Teardown: releasing render context");
        if let Some(backend) = self.backend.as_deref_mut() {
            backend.clear();
            backend.release_render_lists();
        }
        if let Some(surface) = self.surface.take() {
            self.surfaces.remove_surface(surface);
        }
        if let Some(mut backend) = self.backend.take() {
            backend.dispose();
        }

        self.telemetry.clear();
        log::info!("Scene released");
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// Runs one tick of the motion-fusion loop at host time `now_ms`.
    ///
    /// Does nothing unless the scene is active. Returns whether a frame was
    /// rendered.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        if !self.lifecycle.is_active() {
            return false;
        }
        self.clock.tick(now_ms);
        self.fps.update(now_ms);

        for (name, opacity) in self.ramps.advance(now_ms) {
            if let Some(entry) = self.registry.get_mut(&name) {
                entry.opacity = opacity.clamp(0.0, 1.0);
            }
        }

        let animation = self.animator.update(now_ms, &mut self.camera);
        if animation == Some(AnimationStatus::Finished)
            && let Some(controller) = self.controller.as_mut()
        {
            controller.sync_from_camera(&self.camera);
        }

        self.update_objects();

        if !self.ar_active && animation.is_none()
            && let Some(controller) = self.controller.as_mut()
        {
            controller.update(&mut self.camera, self.viewport, self.clock.dt_seconds());
        }

        let tracking = self.is_ar_tracking();
        if tracking {
            self.update_ar_camera();
        }

        self.scene.update_matrices();
        let camera = if tracking { &self.ar_camera } else { &self.camera };
        let Some(backend) = self.backend.as_deref_mut() else {
            return false;
        };
        backend.clear();
        backend.render(&self.scene, camera);

        self.publish_telemetry(now_ms);
        true
    }

    fn update_objects(&mut self) {
        let blend = self.settings.blend_factor;
        let delta = if self.ar_active { self.sensor.delta() } else { None };

        for entry in self.registry.iter() {
            let handle = entry.node();
            let Some(node) = self.scene.get_node_mut(handle) else {
                continue;
            };

            if !self.ar_active {
                node.transform.position = motion::ease_toward(node.transform.position, entry.target_position, blend);
                node.transform.rotation = motion::compose_rotation(entry.rotation, entry.base_rotation());
            } else if let Some(delta) = delta {
                let target = entry.target_position + motion::ar_offset(delta, self.settings.ar_sensitivity);
                node.transform.position = motion::ease_toward(node.transform.position, target, blend);
                node.transform.rotation = motion::compose_rotation(motion::ar_rotation(delta), entry.base_rotation());
            }
            // AR without a reference yet: hold the transform.

            node.visible = entry.visible;
            let opacity = entry.opacity;
            self.scene
                .for_each_mesh_mut(handle, |mesh| mesh.material.set_opacity(opacity));
        }
    }

    fn video_frame_size(&self) -> Option<(u32, u32)> {
        self.video
            .as_ref()
            .and_then(|v| v.frame_size())
            .filter(|&(_, height)| height > 0)
    }

    fn update_ar_camera(&mut self) {
        if let Some(size) = self.video_frame_size() {
            self.ar_camera.set_aspect(aspect_of(size));
        }
        if let Some(sample) = self.sensor.latest() {
            self.ar_camera.transform.rotation = motion::ar_camera_rotation(sample);
        }
    }

    fn publish_telemetry(&mut self, now_ms: f64) {
        let camera = self.active_camera();
        let objects = self
            .registry
            .iter()
            .filter_map(|entry| {
                let node = self.scene.get_node(entry.node())?;
                Some(ObjectTelemetry::new(
                    entry.name(),
                    node.transform.position,
                    node.transform.rotation,
                    entry.opacity,
                    entry.visible,
                ))
            })
            .collect();
        let snapshot = TelemetrySnapshot {
            timestamp_ms: now_ms,
            camera: CameraTelemetry::from_camera(camera),
            objects,
            viewport: ViewportTelemetry::new(camera, self.viewport),
            ar_active: self.ar_active,
            acceleration: self.sensor.acceleration(),
            fps: self.fps.current_fps,
        };
        self.telemetry.publish(snapshot);
    }

    /// Snapshot published by the last rendered frame.
    #[must_use]
    pub fn telemetry(&self) -> Option<&TelemetrySnapshot> {
        self.telemetry.latest()
    }

    /// Receiver that always yields the newest unread snapshot.
    #[must_use]
    pub fn subscribe_telemetry(&self) -> flume::Receiver<TelemetrySnapshot> {
        self.telemetry.subscribe()
    }

    // ========================================================================
    // Object controls
    // ========================================================================

    fn entry_mut(&mut self, name: &str) -> Result<&mut SceneObject> {
        self.registry
            .get_mut(name)
            .ok_or_else(|| MirageError::MissingTarget(name.to_string()))
    }

    /// Position the object eases toward.
    pub fn set_target_position(&mut self, name: &str, position: Vec3) -> Result<()> {
        self.entry_mut(name)?.target_position = position;
        Ok(())
    }

    /// User rotation (XYZ Euler, radians) applied in pointer mode.
    pub fn set_rotation(&mut self, name: &str, rotation: Vec3) -> Result<()> {
        self.entry_mut(name)?.rotation = rotation;
        Ok(())
    }

    /// Stores `clamp(opacity, 0, 1)` and cancels a running ramp for the object.
    pub fn set_opacity(&mut self, name: &str, opacity: f32) -> Result<()> {
        self.entry_mut(name)?.opacity = opacity.clamp(0.0, 1.0);
        self.ramps.cancel(name);
        Ok(())
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) -> Result<()> {
        self.entry_mut(name)?.visible = visible;
        Ok(())
    }

    /// Point-cloud brightness, stored as `max(brightness, 0)`.
    ///
    /// Meshes have no brightness uniform; the call is a logged no-op for them.
    pub fn set_brightness(&mut self, name: &str, brightness: f32) -> Result<()> {
        self.with_point_material(name, |material| material.set_brightness(brightness))
    }

    /// Point size in pixels, stored as `max(size, 0.1)`.
    pub fn set_point_size(&mut self, name: &str, size: f32) -> Result<()> {
        self.with_point_material(name, |material| material.set_point_size(size))
    }

    fn with_point_material(
        &mut self,
        name: &str,
        mut f: impl FnMut(&mut crate::resources::material::PointCloudMaterial),
    ) -> Result<()> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| MirageError::MissingTarget(name.to_string()))?;
        if entry.kind() != ObjectKind::PointCloud {
            log::warn!("'{name}' is not a point cloud; ignoring point material change");
            return Ok(());
        }
        self.scene.for_each_mesh_mut(entry.node(), |mesh| {
            if let Material::PointCloud(material) = &mut mesh.material {
                f(material);
            }
        });
        Ok(())
    }

    /// Fades the object's opacity to `target` over `duration_ms`
    /// (default [`EngineSettings::opacity_ramp_ms`]). Replaces a running ramp.
    pub fn ramp_opacity(&mut self, name: &str, target: f32, duration_ms: Option<f64>) -> Result<()> {
        let duration = duration_ms.unwrap_or(self.settings.opacity_ramp_ms);
        let from = self
            .registry
            .get(name)
            .ok_or_else(|| MirageError::MissingTarget(name.to_string()))?
            .opacity;
        self.ramps.start(name, OpacityRamp::new(from, target, duration));
        Ok(())
    }

    /// Shows or hides the background environment. Returns `false` when no
    /// environment was loaded.
    pub fn set_background_enabled(&mut self, enabled: bool) -> bool {
        match self.scene.environment.as_mut() {
            Some(environment) => {
                environment.enabled = enabled;
                true
            }
            None => {
                log::warn!("No background environment loaded");
                false
            }
        }
    }

    // ========================================================================
    // Camera poses and animation
    // ========================================================================

    /// Saves the primary camera's current placement.
    pub fn capture_camera_pose(&mut self, name: Option<&str>) -> Result<SavedCameraPose> {
        self.poses.capture(name, &self.camera).cloned()
    }

    /// Moves the primary camera to a saved pose. Stops a running animation.
    pub fn apply_camera_pose(&mut self, id: u32) -> Result<()> {
        let pose = self.poses.get(id).ok_or(MirageError::PoseNotFound(id))?;
        self.animator.stop();
        self.camera.transform.position = pose.position;
        self.camera.set_rotation_degrees(pose.rotation);
        if let Some(controller) = self.controller.as_mut() {
            controller.sync_from_camera(&self.camera);
        }
        Ok(())
    }

    pub fn delete_camera_pose(&mut self, id: u32) -> Result<SavedCameraPose> {
        self.poses.remove(id)
    }

    /// Plays the saved poses back. Needs at least two; otherwise a no-op
    /// returning `false`.
    pub fn start_camera_animation(&mut self) -> bool {
        self.animator.start(&self.poses)
    }

    pub fn stop_camera_animation(&mut self) {
        self.animator.stop();
        if let Some(controller) = self.controller.as_mut() {
            controller.sync_from_camera(&self.camera);
        }
    }

    // ========================================================================
    // AR mode and inputs
    // ========================================================================

    /// Opens the camera feed and attaches the orientation sensor.
    ///
    /// The first orientation event afterwards becomes the reference. Calling
    /// it while AR is already on does nothing.
    pub fn start_ar(&mut self, access: SensorAccess) -> Result<()> {
        if !self.lifecycle.is_active() {
            return Err(MirageError::NotActive);
        }
        if self.ar_active {
            return Ok(());
        }
        let video = self
            .video
            .as_deref_mut()
            .ok_or_else(|| MirageError::CameraUnavailable("no video source configured".into()))?;
        let constraints = acquire_stream(video, &self.settings.video).inspect_err(|err| {
            log::error!("{err}");
        })?;

        if let Err(err) = self.sensor.attach(access) {
            log::error!("{err}");
            video.close();
            return Err(err);
        }

        self.ar_active = true;
        self.ar_camera = ar_camera(&self.settings, self.viewport);
        log::info!("AR mode on ({constraints:?})");
        Ok(())
    }

    /// Detaches the sensor, clears the reference and closes the camera feed.
    pub fn stop_ar(&mut self) {
        if !self.ar_active {
            return;
        }
        self.sensor.detach();
        if let Some(video) = self.video.as_deref_mut() {
            video.close();
        }
        self.ar_active = false;
        if let Some(controller) = self.controller.as_mut() {
            controller.sync_from_camera(&self.camera);
        }
        log::info!("AR mode off");
    }

    pub fn handle_orientation(&mut self, sample: OrientationSample) {
        if self.ar_active {
            self.sensor.handle_orientation(sample);
        }
    }

    pub fn handle_motion(&mut self, sample: MotionSample) {
        if self.ar_active {
            self.sensor.handle_motion(sample);
        }
    }

    /// Forwards pointer input to the camera controller (pointer mode only).
    pub fn handle_pointer(&mut self, input: &PointerInput) {
        if self.ar_active || input.is_idle() {
            return;
        }
        if let Some(controller) = self.controller.as_mut() {
            controller.handle_pointer(input);
        }
    }

    /// Container resized to `width` x `height` pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.listening_for_resize || width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        let aspect = aspect_of(self.viewport);
        self.camera.set_aspect(aspect);
        // The AR camera follows the video frame once the stream reports one.
        if self.video_frame_size().is_none() {
            self.ar_camera.set_aspect(aspect);
        }
        if let Some(backend) = self.backend.as_deref_mut() {
            backend.resize(width, height);
        }
    }
}

fn default_controller(camera: &Camera) -> Box<dyn CameraController> {
    let mut controls = OrbitControls::new(Vec3::ZERO, camera.position().length());
    controls.sync_from_camera(camera);
    Box::new(controls)
}

fn aspect_of((width, height): (u32, u32)) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

fn primary_camera(settings: &EngineSettings, viewport: (u32, u32)) -> Camera {
    let cfg = &settings.camera;
    let mut camera = Camera::new_perspective(cfg.fov, aspect_of(viewport), cfg.near, cfg.far).with_name("Primary Camera");
    camera.transform.position = cfg.position;
    camera
}

fn ar_camera(settings: &EngineSettings, viewport: (u32, u32)) -> Camera {
    let cfg = &settings.camera;
    Camera::new_perspective(cfg.fov, aspect_of(viewport), cfg.near, cfg.far).with_name("AR Camera")
}
