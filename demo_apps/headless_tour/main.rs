//! Headless tour
//!
//! Runs a full scene lifecycle without a window:
//!
//! ```text
//! cargo run -p headless_tour -- <asset dir> scan.ply duck.glb [--env sky.hdr]
//! ```
//!
//! Frames are driven from a fake 60 Hz clock. The renderer only logs what it
//! would draw, which makes this handy for checking assets and motion tuning.

use anyhow::{Context, bail};
use glam::Vec3;
use mirage::backend::{RenderBackend, ResourceId, SurfaceHost, SurfaceId};
use mirage::sensors::{StreamConstraints, VideoSource};
use mirage::{
    AssetLoader, Camera, Engine, EngineSettings, MotionSample, OrientationSample, Scene, SensorAccess,
    StartTrigger,
};

const FRAME_MS: f64 = 1000.0 / 60.0;

struct LogBackend {
    frames: u64,
}

impl RenderBackend for LogBackend {
    fn clear(&mut self) {}

    fn render(&mut self, scene: &Scene, camera: &Camera) {
        self.frames += 1;
        if self.frames % 60 == 0 {
            log::info!(
                "frame {}: {} drawable(s) through '{}'",
                self.frames,
                scene.visible_meshes().count(),
                camera.name
            );
        }
    }

    fn release(&mut self, resource: ResourceId) {
        log::debug!("release {resource:?}");
    }

    fn release_render_lists(&mut self) {}

    fn resize(&mut self, width: u32, height: u32) {
        log::info!("resize {width}x{height}");
    }

    fn dispose(&mut self) {
        log::info!("backend disposed after {} frame(s)", self.frames);
    }
}

#[derive(Default)]
struct Headless {
    surfaces: Vec<SurfaceId>,
    next: u64,
}

impl SurfaceHost for Headless {
    fn container_size(&self) -> (u32, u32) {
        (1280, 720)
    }

    fn attached_surfaces(&self) -> Vec<SurfaceId> {
        self.surfaces.clone()
    }

    fn force_context_loss(&mut self, _surface: SurfaceId) {}

    fn remove_surface(&mut self, surface: SurfaceId) {
        self.surfaces.retain(|s| *s != surface);
    }

    fn create_surface(&mut self, _width: u32, _height: u32) -> mirage::Result<(SurfaceId, Box<dyn RenderBackend>)> {
        self.next += 1;
        let id = SurfaceId(self.next);
        self.surfaces.push(id);
        Ok((id, Box::new(LogBackend { frames: 0 })))
    }
}

/// Pretends to be a rear camera that delivers 1280x720 frames.
#[derive(Default)]
struct FakeCamera {
    open: bool,
}

impl VideoSource for FakeCamera {
    fn is_secure_context(&self) -> bool {
        true
    }

    fn open(&mut self, constraints: &StreamConstraints) -> mirage::Result<()> {
        log::info!("camera stream opened with {constraints:?}");
        self.open = true;
        Ok(())
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        self.open.then_some((1280, 720))
    }

    fn close(&mut self) {
        self.open = false;
    }
}

struct Args {
    root: String,
    assets: Vec<String>,
    environment: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = std::env::args().skip(1);
    let root = args.next().context("usage: headless_tour <asset dir> <asset>... [--env <image>]")?;
    let mut assets = Vec::new();
    let mut environment = None;
    while let Some(arg) = args.next() {
        if arg == "--env" {
            environment = Some(args.next().context("--env needs a file name")?);
        } else {
            assets.push(arg);
        }
    }
    if assets.is_empty() {
        bail!("no assets given");
    }
    Ok(Args {
        root,
        assets,
        environment,
    })
}

async fn run(args: Args) -> anyhow::Result<()> {
    let loader = AssetLoader::from_directory(&args.root);
    let mut engine = Engine::new(EngineSettings::default(), Headless::default()).with_video_source(FakeCamera::default());

    let report = engine
        .initialize(StartTrigger::Explicit, &loader, &args.assets, args.environment.as_deref())
        .await?;
    for err in report.errors.iter().chain(&report.warnings) {
        log::warn!("{err}");
    }
    log::info!("registered: {:?}", report.registered);

    let mut now = 0.0;
    let mut tick = |engine: &mut Engine, frames: u32| {
        for _ in 0..frames {
            engine.frame(now);
            now += FRAME_MS;
        }
    };

    // Pointer mode: slide everything right and fade the first object in.
    let names: Vec<String> = engine.registry().iter().map(|o| o.name().to_string()).collect();
    for (i, name) in names.iter().enumerate() {
        engine.set_target_position(name, Vec3::new(i as f32 * 1.5, 0.0, 0.0))?;
    }
    if let Some(first) = names.first() {
        engine.set_opacity(first, 0.0)?;
        engine.ramp_opacity(first, 1.0, Some(500.0))?;
    }
    tick(&mut engine, 60);

    // Two poses and a short fly-through.
    engine.capture_camera_pose(Some("Start"))?;
    engine.handle_pointer(&mirage::PointerInput {
        rotate_drag: glam::Vec2::new(300.0, -80.0),
        zoom: 4.0,
        ..Default::default()
    });
    tick(&mut engine, 90);
    engine.capture_camera_pose(Some("Side"))?;
    engine.start_camera_animation();
    tick(&mut engine, 320);

    // AR mode: level phone, then tilt it back and to the side.
    engine.start_ar(SensorAccess::Granted)?;
    engine.handle_orientation(OrientationSample::new(0.0, 90.0, 0.0));
    for step in 0..120u16 {
        let t = f32::from(step) / 120.0;
        engine.handle_orientation(OrientationSample::new(10.0 * t, 90.0 + 25.0 * t, -15.0 * t));
        engine.handle_motion(MotionSample::new(0.0, 9.81, 0.0));
        tick(&mut engine, 1);
    }

    if let Some(snapshot) = engine.telemetry() {
        println!("{}", snapshot.to_json()?);
    }

    engine.stop_ar();
    engine.teardown();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args))
}
