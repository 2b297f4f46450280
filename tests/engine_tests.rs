//! Engine tests
//!
//! Tests for:
//! - Lifecycle guard: re-entrancy, auto-start suppression, stale loads
//! - Initialization cleanup (stale surfaces, duplicate registry entries)
//! - Per-frame motion fusion in pointer and AR mode
//! - Control surface clamps and missing targets
//! - Teardown release order and re-initialization

mod common;

use glam::{EulerRot, Quat, Vec3};
use mirage::assets::AssetLoader;
use mirage::backend::{ResourceId, SurfaceId};
use mirage::resources::Material;
use mirage::sensors::OrientationSample;
use mirage::{Engine, EngineSettings, LifecycleState, MirageError, PointerInput, SensorAccess, StartTrigger};

use common::*;

fn loader() -> AssetLoader {
    AssetLoader::new()
        .with_point_cloud_decoder(CannedPointClouds::new(wide_cloud()))
        .with_mesh_decoder(CannedMeshes { delay_ms: 0 })
        .with_texture_decoder(CannedTextures)
}

fn engine(log: &CallLog) -> Engine {
    init_logging();
    Engine::new(EngineSettings::default(), MockSurfaceHost::new(log.clone()))
}

async fn active_engine(log: &CallLog) -> Engine {
    let mut engine = engine(log).with_video_source(ScriptedVideo::new());
    let report = engine
        .initialize(StartTrigger::Explicit, &loader(), &["scan.ply", "duck.glb"], Some("sky.png"))
        .await
        .unwrap();
    assert!(report.is_clean());
    engine
}

fn point_material(engine: &Engine, name: &str) -> mirage::PointCloudMaterial {
    let node = engine.object(name).unwrap().node();
    match &engine.scene().get_node(node).unwrap().mesh.as_ref().unwrap().material {
        Material::PointCloud(m) => m.clone(),
        Material::Mesh(_) => panic!("not a point cloud"),
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn initialize_activates_and_renders() {
    let log = call_log();
    let mut engine = active_engine(&log).await;

    assert_eq!(engine.state(), LifecycleState::Active);
    assert!(engine.has_started());
    assert_eq!(engine.registry().len(), 2);
    assert!(engine.scene().environment.is_some());

    assert!(engine.frame(0.0));
    let calls = log.borrow();
    assert!(calls.contains(&Call::CreateSurface(800, 600)));
    assert!(matches!(calls.last(), Some(Call::Render { camera, .. }) if camera == "Primary Camera"));
}

#[tokio::test]
async fn second_initialize_while_running_is_refused() {
    let log = call_log();
    let mut engine = active_engine(&log).await;

    let err = engine.begin_initialize(StartTrigger::Explicit).unwrap_err();
    assert!(matches!(err, MirageError::AlreadyRunning("active")));
    assert_eq!(engine.registry().len(), 2);
}

#[tokio::test]
async fn automatic_restart_is_suppressed_after_first_start() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    engine.teardown();

    assert!(matches!(
        engine.begin_initialize(StartTrigger::Automatic),
        Err(MirageError::AutoStartSuppressed)
    ));
    assert!(engine.begin_initialize(StartTrigger::Explicit).is_ok());
}

#[test]
fn missing_render_context_leaves_engine_idle() {
    let log = call_log();
    let mut host = MockSurfaceHost::new(log.clone());
    host.fail_create = true;
    let mut engine = Engine::new(EngineSettings::default(), host);

    let err = engine.begin_initialize(StartTrigger::Automatic).unwrap_err();
    assert!(matches!(err, MirageError::RenderContextUnavailable(_)));
    assert_eq!(engine.state(), LifecycleState::Idle);
    assert!(!engine.has_started());
    assert!(!engine.frame(0.0));
}

#[tokio::test]
async fn teardown_during_load_discards_batch() {
    let log = call_log();
    let mut engine = engine(&log);
    let loader = AssetLoader::new().with_point_cloud_decoder(CannedPointClouds::new(wide_cloud()).delay("late.ply", 20));

    let ticket = engine.begin_initialize(StartTrigger::Explicit).unwrap();
    assert_eq!(engine.state(), LifecycleState::Initializing);
    let batch = loader.load(&["late.ply"], None).await;
    engine.teardown();

    assert!(engine.complete_initialize(ticket, batch).is_none());
    assert_eq!(engine.state(), LifecycleState::Idle);
    assert!(engine.registry().is_empty());
    assert_eq!(engine.scene().node_count(), 0);
    assert!(!engine.frame(16.0));
}

#[tokio::test]
async fn stale_surfaces_are_removed_before_creating_a_new_one() {
    let log = call_log();
    let host = MockSurfaceHost::new(log.clone());
    host.attached.borrow_mut().push(SurfaceId(99));
    let mut engine = Engine::new(EngineSettings::default(), host);

    engine.begin_initialize(StartTrigger::Explicit).unwrap();

    let calls = log.borrow();
    let lost = calls.iter().position(|c| *c == Call::ForceContextLoss(SurfaceId(99))).unwrap();
    let removed = calls.iter().position(|c| *c == Call::RemoveSurface(SurfaceId(99))).unwrap();
    let created = calls.iter().position(|c| matches!(c, Call::CreateSurface(..))).unwrap();
    assert!(lost < removed && removed < created);
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn teardown_releases_every_resource() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    engine.frame(0.0);
    let surface = engine.surface().unwrap();
    let point_geometry = {
        let node = engine.object("scan.ply").unwrap().node();
        engine.scene().get_node(node).unwrap().mesh.as_ref().unwrap().geometry.uuid
    };
    let environment = engine.scene().environment.as_ref().unwrap().texture.uuid;
    log.borrow_mut().clear();

    engine.teardown();

    assert_eq!(engine.state(), LifecycleState::Idle);
    assert!(engine.registry().is_empty());
    assert_eq!(engine.scene().node_count(), 0);
    assert!(engine.scene().environment.is_none());
    assert!(engine.telemetry().is_none());
    assert!(engine.surface().is_none());

    let calls = log.borrow();
    assert!(calls.contains(&Call::Release(ResourceId::Geometry(point_geometry))));
    assert!(calls.contains(&Call::Release(ResourceId::Texture(environment))));
    // Mesh container: geometry, material and one texture map.
    let textures = calls
        .iter()
        .filter(|c| matches!(c, Call::Release(ResourceId::Texture(_))))
        .count();
    assert_eq!(textures, 2);
    assert_eq!(calls.last(), Some(&Call::Dispose));
    let remove = calls.iter().position(|c| *c == Call::RemoveSurface(surface)).unwrap();
    let lists = calls.iter().position(|c| *c == Call::ReleaseRenderLists).unwrap();
    assert!(lists < remove);
}

#[tokio::test]
async fn engine_can_be_initialized_again_after_teardown() -> anyhow::Result<()> {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    engine.teardown();
    engine.teardown();

    let report = engine
        .initialize(StartTrigger::Explicit, &loader(), &["scan.ply"], None)
        .await?;
    assert_eq!(report.registered, vec!["scan.ply".to_string()]);
    assert_eq!(engine.registry().len(), 1);
    assert!(engine.frame(0.0));
    Ok(())
}

// ============================================================================
// Pointer-mode motion
// ============================================================================

#[tokio::test]
async fn position_eases_toward_target() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    engine.set_target_position("scan.ply", Vec3::new(1.0, 0.0, 0.0)).unwrap();

    let node = engine.object("scan.ply").unwrap().node();
    let mut remaining = 1.0f32;
    for i in 0..10 {
        engine.frame(f64::from(i) * 16.0);
        remaining *= 0.9;
        let x = engine.scene().get_node(node).unwrap().transform.position.x;
        assert!(approx_eq(1.0 - x, remaining), "frame {i}: x = {x}");
    }
}

#[tokio::test]
async fn user_rotation_composes_over_base() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    let rotation = Vec3::new(0.0, 0.5, 0.0);
    engine.set_rotation("scan.ply", rotation).unwrap();
    engine.frame(0.0);

    let entry = engine.object("scan.ply").unwrap();
    let expected = Quat::from_euler(EulerRot::XYZ, 0.0, 0.5, 0.0) * entry.base_rotation();
    let actual = engine.scene().get_node(entry.node()).unwrap().transform.rotation;
    assert!(actual.abs_diff_eq(expected, 1e-5));
}

#[tokio::test]
async fn object_controls_clamp_their_inputs() {
    let log = call_log();
    let mut engine = active_engine(&log).await;

    engine.set_opacity("scan.ply", 1.7).unwrap();
    assert!(approx_eq(engine.object("scan.ply").unwrap().opacity, 1.0));
    engine.set_opacity("scan.ply", -0.3).unwrap();
    assert!(approx_eq(engine.object("scan.ply").unwrap().opacity, 0.0));

    engine.set_brightness("scan.ply", -2.0).unwrap();
    engine.set_point_size("scan.ply", 0.0).unwrap();
    engine.frame(0.0);

    let material = point_material(&engine, "scan.ply");
    assert!(approx_eq(material.brightness(), 0.0));
    assert!(approx_eq(material.point_size(), 0.1));
    assert!(approx_eq(material.opacity(), 0.0));

    engine.set_brightness("scan.ply", 3.0).unwrap();
    assert!(approx_eq(point_material(&engine, "scan.ply").brightness(), 3.0));
}

#[tokio::test]
async fn controls_on_unknown_object_fail() {
    let log = call_log();
    let mut engine = active_engine(&log).await;

    assert!(matches!(
        engine.set_opacity("ghost.ply", 0.5),
        Err(MirageError::MissingTarget(name)) if name == "ghost.ply"
    ));
    assert!(engine.set_visible("ghost.ply", false).is_err());
    assert!(engine.set_point_size("ghost.ply", 2.0).is_err());
}

#[tokio::test]
async fn point_controls_ignore_meshes() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    assert!(engine.set_brightness("duck.glb", 2.0).is_ok());
    assert!(engine.set_point_size("duck.glb", 4.0).is_ok());
}

#[tokio::test]
async fn hidden_objects_are_not_rendered() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    engine.frame(0.0);
    let before = match log.borrow().last() {
        Some(Call::Render { meshes, .. }) => *meshes,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(before, 2);

    engine.set_visible("duck.glb", false).unwrap();
    engine.frame(16.0);
    assert!(matches!(log.borrow().last(), Some(Call::Render { meshes: 1, .. })));
}

#[tokio::test]
async fn opacity_ramp_reaches_target_and_manual_set_cancels() {
    let log = call_log();
    let mut engine = active_engine(&log).await;

    engine.ramp_opacity("scan.ply", 0.0, Some(100.0)).unwrap();
    engine.frame(1000.0);
    engine.frame(1050.0);
    assert!(approx_eq(engine.object("scan.ply").unwrap().opacity, 0.5));
    engine.frame(1100.0);
    assert!(approx_eq(engine.object("scan.ply").unwrap().opacity, 0.0));
    assert!(engine.opacity_ramps().is_empty());

    engine.ramp_opacity("scan.ply", 1.0, None).unwrap();
    engine.frame(2000.0);
    engine.set_opacity("scan.ply", 0.25).unwrap();
    engine.frame(2500.0);
    assert!(approx_eq(engine.object("scan.ply").unwrap().opacity, 0.25));
}

#[tokio::test]
async fn background_toggle_needs_an_environment() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    assert!(engine.set_background_enabled(false));
    assert!(!engine.scene().environment.as_ref().unwrap().enabled);

    let mut bare = Engine::new(EngineSettings::default(), MockSurfaceHost::new(call_log()));
    bare.initialize(StartTrigger::Explicit, &loader(), &["scan.ply"], None)
        .await
        .unwrap();
    assert!(!bare.set_background_enabled(true));
}

#[tokio::test]
async fn pointer_input_moves_the_camera() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    engine.frame(0.0);
    let before = engine.camera().position();

    engine.handle_pointer(&PointerInput {
        rotate_drag: glam::Vec2::new(120.0, 0.0),
        ..Default::default()
    });
    for i in 1..30 {
        engine.frame(f64::from(i) * 16.0);
    }
    assert!(!vec3_approx(engine.camera().position(), before));
}

#[tokio::test]
async fn resize_updates_camera_and_backend() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    engine.resize(1000, 500);

    assert_eq!(engine.viewport(), (1000, 500));
    assert!(approx_eq(engine.camera().aspect(), 2.0));
    assert_eq!(log.borrow().last(), Some(&Call::Resize(1000, 500)));

    engine.teardown();
    log.borrow_mut().clear();
    engine.resize(640, 480);
    assert!(log.borrow().is_empty());
}

// ============================================================================
// AR mode
// ============================================================================

#[tokio::test]
async fn resize_moves_ar_camera_until_video_reports_a_frame() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    engine.resize(1000, 500);
    assert!(approx_eq(engine.ar_camera().aspect(), 2.0));

    engine.start_ar(SensorAccess::Granted).unwrap();
    engine.handle_orientation(OrientationSample::new(0.0, 90.0, 0.0));
    engine.frame(0.0);
    assert!(approx_eq(engine.ar_camera().aspect(), 1280.0 / 720.0));

    engine.resize(600, 600);
    assert!(approx_eq(engine.camera().aspect(), 1.0));
    assert!(approx_eq(engine.ar_camera().aspect(), 1280.0 / 720.0));
}

#[tokio::test]
async fn ar_requires_active_scene() {
    let mut engine = engine(&call_log()).with_video_source(ScriptedVideo::new());
    assert!(matches!(engine.start_ar(SensorAccess::Granted), Err(MirageError::NotActive)));
}

#[tokio::test]
async fn ar_holds_transforms_until_reference_latches() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    engine.set_target_position("scan.ply", Vec3::X).unwrap();
    engine.frame(0.0);
    let node = engine.object("scan.ply").unwrap().node();
    let held = engine.scene().get_node(node).unwrap().transform.position;

    engine.start_ar(SensorAccess::Granted).unwrap();
    assert!(engine.is_ar_active());
    assert!(!engine.is_ar_tracking());

    for i in 1..5 {
        engine.frame(f64::from(i) * 16.0);
    }
    assert_eq!(engine.scene().get_node(node).unwrap().transform.position, held);
    assert!(matches!(log.borrow().last(), Some(Call::Render { camera, .. }) if camera == "Primary Camera"));
}

#[tokio::test]
async fn ar_rotation_counters_device_motion() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    engine.start_ar(SensorAccess::Granted).unwrap();

    engine.handle_orientation(OrientationSample::new(10.0, 90.0, 0.0));
    assert!(engine.is_ar_tracking());
    engine.handle_orientation(OrientationSample::new(10.0, 110.0, 0.0));
    engine.frame(0.0);

    let entry = engine.object("scan.ply").unwrap();
    let beta = 20f32.to_radians();
    let expected = Quat::from_euler(EulerRot::XYZ, -beta * 0.5, 0.0, 0.0) * entry.base_rotation();
    let node = engine.scene().get_node(entry.node()).unwrap();
    assert!(node.transform.rotation.abs_diff_eq(expected, 1e-5));

    // offset (gamma, beta, 0) * 0.05, eased by 0.1 from the origin
    let y = beta * 0.05 * 0.1;
    assert!(vec3_approx(node.transform.position, Vec3::new(0.0, y, 0.0)));

    assert!(matches!(log.borrow().last(), Some(Call::Render { camera, .. }) if camera == "AR Camera"));
    assert!(approx_eq(engine.ar_camera().aspect(), 1280.0 / 720.0));
}

#[tokio::test]
async fn ar_permission_failures() {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    assert!(matches!(
        engine.start_ar(SensorAccess::Denied),
        Err(MirageError::PermissionDenied(_))
    ));
    assert!(!engine.is_ar_active());

    let mut video = ScriptedVideo::new();
    video.secure = false;
    let mut insecure = Engine::new(EngineSettings::default(), MockSurfaceHost::new(call_log())).with_video_source(video);
    insecure
        .initialize(StartTrigger::Explicit, &loader(), &["scan.ply"], None)
        .await
        .unwrap();
    assert!(matches!(
        insecure.start_ar(SensorAccess::Granted),
        Err(MirageError::InsecureContext)
    ));
}

#[tokio::test]
async fn camera_stream_retries_with_relaxed_constraints() {
    let mut video = ScriptedVideo::new();
    video.open_results = vec![Err(MirageError::CameraUnavailable("1280x720 not supported".into()))];
    let opened = video.opened.clone();

    let mut engine = Engine::new(EngineSettings::default(), MockSurfaceHost::new(call_log())).with_video_source(video);
    engine
        .initialize(StartTrigger::Explicit, &loader(), &["scan.ply"], None)
        .await
        .unwrap();
    engine.start_ar(SensorAccess::Granted).unwrap();

    let opened = opened.borrow();
    assert_eq!(opened.len(), 2);
    assert_eq!(opened[0].ideal_width, Some(1280));
    assert_eq!(opened[1].ideal_width, None);
}

#[tokio::test]
async fn stop_ar_clears_reference_and_closes_stream() {
    let video = ScriptedVideo::new();
    let closed = video.closed.clone();
    let mut engine = Engine::new(EngineSettings::default(), MockSurfaceHost::new(call_log())).with_video_source(video);
    engine
        .initialize(StartTrigger::Explicit, &loader(), &["scan.ply"], None)
        .await
        .unwrap();

    engine.start_ar(SensorAccess::Granted).unwrap();
    engine.handle_orientation(OrientationSample::new(0.0, 90.0, 0.0));
    engine.stop_ar();

    assert!(!engine.is_ar_active());
    assert!(engine.sensor().reference().is_none());
    assert_eq!(*closed.borrow(), 1);

    // Events after stopping are ignored.
    engine.handle_orientation(OrientationSample::new(0.0, 45.0, 0.0));
    assert!(engine.sensor().latest().is_none());
}

// ============================================================================
// Telemetry
// ============================================================================

#[tokio::test]
async fn telemetry_reports_latest_frame() -> anyhow::Result<()> {
    let log = call_log();
    let mut engine = active_engine(&log).await;
    let rx = engine.subscribe_telemetry();

    engine.frame(0.0);
    engine.frame(16.0);

    let snapshot = rx.try_recv()?;
    assert!((snapshot.timestamp_ms - 16.0).abs() < f64::EPSILON);
    assert!(rx.try_recv().is_err());

    assert_eq!(snapshot.objects.len(), 2);
    assert_eq!(snapshot.camera.position, [0.0, 0.0, 5.0]);
    assert_eq!(snapshot.viewport.width, 800);
    assert!(approx_eq(snapshot.viewport.distance, 5.0));
    assert!(!snapshot.ar_active);

    let json = snapshot.to_json()?;
    assert!(json.contains("\"scan.ply\""));
    Ok(())
}
