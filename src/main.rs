// SPDX-License-Identifier: GPL-3.0-only

use camera_preview::Config;
use camera_preview::backends::display::DeclaredOrientation;
use camera_preview::constants::runner::DEFAULT_FRAMES;
use camera_preview::geometry::CameraOutputSize;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-preview")]
#[command(about = "Full-screen rear camera preview, upright for any display rotation")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: ~/.config/camera-preview/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Print the rotation correction for a display rotation
    Resolve {
        /// Orientation the layout declares (portrait or landscape)
        #[arg(long, default_value = "portrait")]
        declared: DeclaredOrientation,

        /// Display rotation in degrees; prints all four when omitted
        #[arg(long)]
        rotation: Option<u32>,
    },

    /// Print the preview viewport for a display and camera size
    Viewport {
        /// Display size in pixels, e.g. 1080x1920
        #[arg(long, value_parser = cli::parse_dimensions)]
        display: (u32, u32),

        /// Camera output size, e.g. 1920x1080
        #[arg(long)]
        camera: CameraOutputSize,
    },

    /// Run the preview against a simulated display
    Run {
        /// Frames to render (0 runs until Ctrl+C)
        #[arg(short, long, default_value_t = DEFAULT_FRAMES)]
        frames: u64,

        /// Display size in pixels, e.g. 1080x1920
        #[arg(long, value_parser = cli::parse_dimensions)]
        display: Option<(u32, u32)>,

        /// Initial display rotation in degrees
        #[arg(long)]
        rotation: Option<u32>,

        /// Orientation the layout declares (portrait or landscape)
        #[arg(long)]
        declared: Option<DeclaredOrientation>,

        /// Save the last frame as PNG (file or directory; default: snapshot_dir)
        #[arg(long, num_args = 0..=1)]
        snapshot: Option<Option<PathBuf>>,

        /// Record draw calls instead of rendering on the GPU
        #[arg(long, conflicts_with = "snapshot")]
        dry_run: bool,

        /// Rotate the simulated display a quarter turn every N frames
        #[arg(long)]
        rotate_every: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v; e.g. RUST_LOG=camera_preview=debug
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::List => cli::list_cameras(&config)?,
        Commands::Resolve { declared, rotation } => cli::resolve_orientation(declared, rotation)?,
        Commands::Viewport { display, camera } => cli::print_viewport(display, camera)?,
        Commands::Run {
            frames,
            display,
            rotation,
            declared,
            snapshot,
            dry_run,
            rotate_every,
        } => cli::run_preview(
            &config,
            cli::RunOptions {
                frames,
                display,
                rotation,
                declared,
                snapshot,
                dry_run,
                rotate_every,
            },
        )?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dry_run_rejects_snapshot() {
        let result = Cli::try_parse_from(["camera-preview", "run", "--dry-run", "--snapshot"]);
        let err = result.err().map(|e| e.kind());
        assert_eq!(err, Some(clap::error::ErrorKind::ArgumentConflict));

        let cli = Cli::try_parse_from(["camera-preview", "run", "--snapshot", "out.png"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Run {
                snapshot: Some(Some(_)),
                dry_run: false,
                ..
            }
        ));
    }
}
