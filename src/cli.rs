// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the preview
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Inspecting the orientation table and viewport math
//! - Running the preview headless against a simulated display

use camera_preview::backends::camera::{CameraSession, SessionFailure, SessionState, get_backend};
use camera_preview::backends::display::{
    DeclaredOrientation, DisplayHost, DisplayRotation, SimulatedDisplay,
};
use camera_preview::constants::runner::FRAME_PERIOD;
use camera_preview::geometry::{CameraOutputSize, DeviceMountModel, compute_viewport, resolve};
use camera_preview::gpu::PreviewRenderer;
use camera_preview::gpu::recording::RecordingRenderer;
use camera_preview::gpu::wgpu_renderer::WgpuRenderer;
use camera_preview::render::{FrameOutcome, FramePresenter};
use camera_preview::{AppError, AppResult, Config};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Parse `WIDTHxHEIGHT`
pub fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    s.parse::<CameraOutputSize>()
        .map(|size| (size.width(), size.height()))
}

fn parse_rotation(degrees: u32) -> AppResult<DisplayRotation> {
    DisplayRotation::from_degrees(degrees).ok_or_else(|| {
        AppError::Other(format!(
            "rotation must be 0, 90, 180 or 270, got {degrees}"
        ))
    })
}

/// List all available cameras
pub fn list_cameras(config: &Config) -> AppResult<()> {
    let backend = get_backend(config).map_err(|e| AppError::DeviceUnavailable(e.to_string()))?;
    let cameras = backend
        .enumerate_cameras()
        .map_err(|e| AppError::DeviceUnavailable(e.to_string()))?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({} backend):", backend.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {} ({} facing)", index, camera.name, camera.facing);
        match backend.output_sizes(camera) {
            Ok(sizes) if !sizes.is_empty() => {
                let sizes: Vec<String> = sizes.iter().map(|s| s.to_string()).collect();
                println!("      Sizes: {}", sizes.join(", "));
            }
            Ok(_) => println!("      Sizes: none advertised"),
            Err(e) => println!("      Sizes: unavailable ({e})"),
        }
        println!();
    }

    Ok(())
}

/// Print the rotation correction for one rotation, or the whole table
pub fn resolve_orientation(declared: DeclaredOrientation, rotation: Option<u32>) -> AppResult<()> {
    let rotations = match rotation {
        Some(degrees) => vec![parse_rotation(degrees)?],
        None => DisplayRotation::ALL.to_vec(),
    };

    println!("Declared orientation: {declared}");
    println!();
    println!("  {:>8}  {:>16}  {:>10}", "display", "portrait-natural", "correction");
    for rotation in rotations {
        // The mount model is derived from the rotation observed at startup
        let mount = DeviceMountModel::derive(declared, rotation);
        let correction = resolve(rotation, mount);
        println!(
            "  {:>8}  {:>16}  {:>10}",
            rotation.to_string(),
            mount.is_portrait_natural(),
            correction.to_string()
        );
    }
    Ok(())
}

/// Print the viewport for a display and camera size
pub fn print_viewport(display: (u32, u32), camera: CameraOutputSize) -> AppResult<()> {
    let rect = compute_viewport(display.0, display.1, camera);
    println!("Display: {}x{}", display.0, display.1);
    println!("Camera:  {camera}");
    println!("Viewport: {rect}");
    Ok(())
}

/// Options for the headless run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Frames to render, 0 for until Ctrl+C
    pub frames: u64,
    pub display: Option<(u32, u32)>,
    pub rotation: Option<u32>,
    pub declared: Option<DeclaredOrientation>,
    /// `Some(None)` writes to the configured snapshot directory
    pub snapshot: Option<Option<PathBuf>>,
    pub dry_run: bool,
    pub rotate_every: Option<u64>,
}

#[derive(Debug, Default)]
struct RunStats {
    idle: u64,
    awaiting_image: u64,
    fresh: u64,
    repeated: u64,
}

/// Run the preview headless against a simulated display
pub fn run_preview(config: &Config, options: RunOptions) -> AppResult<()> {
    let (width, height) = options
        .display
        .unwrap_or((config.display.width, config.display.height));
    let rotation = parse_rotation(options.rotation.unwrap_or(config.display.rotation))?;
    let declared = options.declared.unwrap_or(config.display.declared);
    let display = Arc::new(SimulatedDisplay::new(width, height, rotation, declared));

    println!("Display: {width}x{height} at {rotation}, declared {declared}");

    if options.dry_run {
        drive(config, &options, display, RecordingRenderer::new())?;
        return Ok(());
    }

    let renderer = WgpuRenderer::new()?;
    println!("GPU: {}", renderer.device_info().adapter_name);
    let presenter = drive(config, &options, display, renderer)?;

    if let Some(target) = &options.snapshot {
        let path = snapshot_path(target.as_deref(), config.snapshot_dir.as_deref())?;
        let image = presenter.renderer().read_pixels()?;
        image
            .save(&path)
            .map_err(|e| AppError::Other(format!("failed to write {}: {e}", path.display())))?;
        println!("Snapshot: {}", path.display());
    }
    Ok(())
}

fn drive<R: PreviewRenderer>(
    config: &Config,
    options: &RunOptions,
    display: Arc<SimulatedDisplay>,
    renderer: R,
) -> AppResult<FramePresenter<R>> {
    let backend = get_backend(config).map_err(|e| AppError::DeviceUnavailable(e.to_string()))?;
    let host: Arc<dyn DisplayHost> = display.clone();
    let (mut presenter, producer) = FramePresenter::new(renderer, host, config.clear_color)?;

    let mut session = CameraSession::new(backend, producer);
    let monitor = session.monitor();
    presenter.bind_session(monitor.clone());

    let (width, height) = display.pixel_size();
    presenter.on_surface_created(width, height)?;
    session.open()?;

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| AppError::Other(format!("failed to install Ctrl+C handler: {e}")))?;

    if options.frames == 0 {
        println!("Rendering... (press Ctrl+C to stop)");
    } else {
        println!("Rendering {} frames... (press Ctrl+C to stop early)", options.frames);
    }

    let start = Instant::now();
    let mut stats = RunStats::default();
    let mut frame = 0u64;

    while options.frames == 0 || frame < options.frames {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        if let Some(every) = options.rotate_every.filter(|n| *n > 0) {
            if frame > 0 && frame % every == 0 {
                let next = display.rotate_quarter_turn();
                let (width, height) = display.pixel_size();
                info!(rotation = %next, width, height, "Simulated display rotated");
                presenter.on_surface_changed(width, height)?;
            }
        }

        match presenter.draw_frame()? {
            FrameOutcome::Idle => stats.idle += 1,
            FrameOutcome::AwaitingImage => stats.awaiting_image += 1,
            FrameOutcome::Drawn { fresh: true } => stats.fresh += 1,
            FrameOutcome::Drawn { fresh: false } => stats.repeated += 1,
        }

        if monitor.state() == SessionState::Closed {
            if let Some(failure) = monitor.failure() {
                warn!(?failure, "Camera session failed");
                session.close();
                return Err(match failure {
                    SessionFailure::DeviceUnavailable => {
                        AppError::DeviceUnavailable("camera session closed".to_string())
                    }
                    SessionFailure::ConfigurationFailed => {
                        AppError::ConfigurationFailed("camera session closed".to_string())
                    }
                });
            }
        }

        frame += 1;
        std::thread::sleep(FRAME_PERIOD);
    }

    session.close();

    println!();
    println!("Rendered {} frames in {:.1}s", frame, start.elapsed().as_secs_f64());
    println!(
        "  drawn: {} new, {} repeated; idle: {}; awaiting image: {}",
        stats.fresh, stats.repeated, stats.idle, stats.awaiting_image
    );
    if let Some(geometry) = presenter.geometry() {
        println!(
            "  correction: {}, viewport: {}",
            geometry.rotation, geometry.viewport
        );
    }

    Ok(presenter)
}

fn snapshot_path(target: Option<&Path>, default_dir: Option<&Path>) -> AppResult<PathBuf> {
    let timestamped = |dir: &Path| -> AppResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        Ok(dir.join(format!("preview_{timestamp}.png")))
    };

    match target {
        Some(path) if path.is_dir() => timestamped(path),
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Ok(path.to_path_buf())
        }
        None => timestamped(default_dir.unwrap_or(Path::new("."))),
    }
}
