//! Resource, settings and sensor tests
//!
//! Tests for:
//! - EngineSettings defaults and JSON overrides
//! - Point-cloud material clamps, shader contract and CPU shading reference
//! - Orientation sensor latching and deltas
//! - Motion helpers and telemetry rounding

mod common;

use glam::{Mat4, Vec3};

use mirage::motion::{ar_offset, ar_rotation, ease_toward};
use mirage::resources::{POINT_CLOUD_SHADER, PointCloudMaterial, PointInstance, PointCloudUniforms, shade_point, srgb_to_linear};
use mirage::sensors::{MotionSample, OrientationSample, OrientationSensor, SensorAccess};
use mirage::settings::EngineSettings;
use mirage::telemetry::{round1, round2};
use mirage::MirageError;

use common::*;

// ============================================================================
// Settings
// ============================================================================

#[test]
fn settings_defaults() {
    let settings = EngineSettings::default();
    assert!(approx_eq(settings.blend_factor, 0.1));
    assert!(approx_eq(settings.ar_sensitivity, 0.05));
    assert!(approx_eq(settings.point_cloud_target_size, 2.0));
    assert_eq!(settings.max_camera_poses, 4);
    assert!((settings.animation_duration_ms - 5000.0).abs() < f64::EPSILON);
    assert!(approx_eq(settings.camera.fov, 75.0));
    assert_eq!(settings.camera.position, Vec3::new(0.0, 0.0, 5.0));
    assert_eq!((settings.video.ideal_width, settings.video.ideal_height), (1280, 720));
}

#[test]
fn settings_json_overrides_only_given_fields() {
    let settings = EngineSettings::from_json_str(
        r#"{ "blend_factor": 0.25, "camera": { "fov": 60.0 }, "video": { "prefer_rear_camera": false } }"#,
    )
    .unwrap();
    assert!(approx_eq(settings.blend_factor, 0.25));
    assert!(approx_eq(settings.camera.fov, 60.0));
    assert!(approx_eq(settings.camera.near, EngineSettings::default().camera.near));
    assert!(!settings.video.prefer_rear_camera);
    assert_eq!(settings.max_camera_poses, 4);
}

#[test]
fn settings_json_rejects_garbage() {
    assert!(matches!(
        EngineSettings::from_json_str("{ blend_factor: }"),
        Err(MirageError::JsonError(_))
    ));
}

// ============================================================================
// Point-cloud material
// ============================================================================

#[test]
fn point_material_clamps() {
    let mut material = PointCloudMaterial::new(0.01);
    assert!(approx_eq(material.point_size(), 0.1));

    material.set_opacity(2.0);
    assert!(approx_eq(material.opacity(), 1.0));
    material.set_opacity(-1.0);
    assert!(approx_eq(material.opacity(), 0.0));

    material.set_brightness(-0.5);
    assert!(approx_eq(material.brightness(), 0.0));
    material.set_brightness(4.0);
    assert!(approx_eq(material.brightness(), 4.0));
}

#[test]
fn point_material_blends_without_depth_writes() {
    let material = PointCloudMaterial::new(1.0);
    assert!(material.transparent());
    assert!(!material.depth_write());
    assert_eq!(material.blend_state(), wgpu::BlendState::ALPHA_BLENDING);
    assert_eq!(material.topology(), wgpu::PrimitiveTopology::TriangleList);

    let layout = PointCloudMaterial::instance_layout();
    assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
    assert_eq!(layout.array_stride, std::mem::size_of::<PointInstance>() as u64);
    assert_eq!(PointCloudMaterial::VERTICES_PER_POINT, 6);
    assert!(POINT_CLOUD_SHADER.contains("@builtin(vertex_index)"));
}

#[test]
fn uniform_block_layout() {
    assert_eq!(std::mem::size_of::<PointCloudUniforms>(), 96);

    let mut material = PointCloudMaterial::new(3.0);
    material.set_opacity(0.5);
    let uniforms = material.uniforms(Mat4::IDENTITY, [800.0, 600.0]);
    assert!(approx_eq(uniforms.point_size, 3.0));
    assert!(approx_eq(uniforms.opacity, 0.5));
    assert_eq!(uniforms.viewport_size, [800.0, 600.0]);
}

#[test]
fn shader_exposes_material_uniforms() {
    for field in ["point_size", "opacity", "brightness"] {
        assert!(POINT_CLOUD_SHADER.contains(field), "missing {field}");
    }
}

#[test]
fn shading_is_linear_times_brightness() {
    assert!(approx_eq(srgb_to_linear(0.0), 0.0));
    assert!(approx_eq(srgb_to_linear(1.0), 1.0));
    assert!(approx_eq(srgb_to_linear(0.5), 0.214_041));

    let [r, g, b, a] = shade_point([1.0, 0.5, 0.0], 2.0, 0.3);
    assert!(approx_eq(r, 2.0));
    assert!(approx_eq(g, 0.428_082));
    assert!(approx_eq(b, 0.0));
    assert!(approx_eq(a, 0.3));
}

// ============================================================================
// Sensors
// ============================================================================

#[test]
fn first_sample_becomes_reference() {
    let mut sensor = OrientationSensor::new();
    sensor.handle_orientation(OrientationSample::new(10.0, 20.0, 30.0));
    assert!(sensor.reference().is_none(), "detached sensors ignore events");

    sensor.attach(SensorAccess::Granted).unwrap();
    sensor.handle_orientation(OrientationSample::new(10.0, 20.0, 30.0));
    sensor.handle_orientation(OrientationSample::new(40.0, 20.0, 0.0));

    assert_eq!(sensor.reference(), Some(OrientationSample::new(10.0, 20.0, 30.0)));
    let delta = sensor.delta().unwrap();
    assert!(approx_eq(delta.alpha, 30f32.to_radians()));
    assert!(approx_eq(delta.beta, 0.0));
    assert!(approx_eq(delta.gamma, -30f32.to_radians()));
}

#[test]
fn incomplete_samples_are_ignored() {
    let mut sensor = OrientationSensor::new();
    sensor.attach(SensorAccess::Granted).unwrap();
    sensor.handle_orientation(OrientationSample::new(f32::NAN, 0.0, 0.0));
    assert!(!sensor.is_tracking());
}

#[test]
fn detach_forgets_everything() {
    let mut sensor = OrientationSensor::new();
    sensor.attach(SensorAccess::Granted).unwrap();
    sensor.handle_orientation(OrientationSample::new(0.0, 90.0, 0.0));
    sensor.handle_motion(MotionSample::new(0.0, 9.8, 0.0));
    sensor.detach();

    assert!(!sensor.is_attached());
    assert!(sensor.reference().is_none());
    assert!(sensor.acceleration().is_none());
}

#[test]
fn refused_or_missing_sensor() {
    let mut sensor = OrientationSensor::new();
    assert!(matches!(sensor.attach(SensorAccess::Denied), Err(MirageError::PermissionDenied(_))));
    assert!(matches!(
        sensor.attach(SensorAccess::Unavailable),
        Err(MirageError::SensorUnavailable(_))
    ));
    assert!(!sensor.is_attached());
}

// ============================================================================
// Motion helpers and telemetry
// ============================================================================

#[test]
fn easing_decays_geometrically() {
    let target = Vec3::new(10.0, 0.0, 0.0);
    let mut p = Vec3::ZERO;
    for _ in 0..5 {
        p = ease_toward(p, target, 0.1);
    }
    assert!(approx_eq(10.0 - p.x, 10.0 * 0.9f32.powi(5)));
}

#[test]
fn ar_helpers_halve_and_scale() {
    let mut sensor = OrientationSensor::new();
    sensor.attach(SensorAccess::Granted).unwrap();
    sensor.handle_orientation(OrientationSample::new(0.0, 0.0, 0.0));
    sensor.handle_orientation(OrientationSample::new(20.0, 40.0, -60.0));
    let delta = sensor.delta().unwrap();

    let rotation = ar_rotation(delta);
    assert!(vec3_approx(
        rotation,
        Vec3::new(-20f32.to_radians(), -10f32.to_radians(), 30f32.to_radians())
    ));

    let offset = ar_offset(delta, 0.05);
    assert!(vec3_approx(
        offset,
        Vec3::new(-60f32.to_radians() * 0.05, 40f32.to_radians() * 0.05, 0.0)
    ));
}

#[test]
fn telemetry_rounding() {
    assert!(approx_eq(round2(1.23456), 1.23));
    assert!(approx_eq(round2(-0.005_1), -0.01));
    assert!(approx_eq(round1(179.96), 180.0));
    assert!(approx_eq(round1(12.34), 12.3));
}
