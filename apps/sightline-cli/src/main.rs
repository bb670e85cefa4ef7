use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sightline_kernel::{ReferenceKernel, ReproCapture, TestScene, VisibilityKernel};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sightline-cli", about = "Offline tools for sightline visibility captures")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// Replay a reproduction capture through the reference kernel
    Replay {
        /// Path to a capture JSON file
        #[arg(long)]
        file: String,
    },
    /// Rebuild a minimal test scene from a capture and write it as JSON
    Fixture {
        /// Path to a capture JSON file
        #[arg(long)]
        file: String,
        /// Output path for the scene fixture
        #[arg(long)]
        out: String,
        /// Name recorded in the fixture
        #[arg(long, default_value = "repro")]
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("sightline-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", sightline_common::crate_info());
            println!("kernel: {}", sightline_kernel::crate_info());
            println!("cache: {}", sightline_cache::crate_info());
            println!("fog: {}", sightline_fog::crate_info());
            println!("vision: {}", sightline_vision::crate_info());
        }
        Commands::Replay { file } => {
            let capture =
                ReproCapture::load(&file).with_context(|| format!("loading capture {file}"))?;
            let query = capture.query();
            let mut kernel = ReferenceKernel::new();
            // Elevation bounds recorded in the capture are honored.
            let snapshot = kernel.build_snapshot(&capture.walls, &[], true)?;
            let restricted = kernel.compute(Some(snapshot), capture.kind, &query)?;
            let permissive = kernel.compute(None, capture.kind, &query)?;

            println!("walls: {}", capture.walls.len());
            println!(
                "restricted: los {} vertices (area {:.1}), fov {} vertices (area {:.1})",
                restricted.los.vertex_count(),
                restricted.los.area(),
                restricted.fov.vertex_count(),
                restricted.fov.area(),
            );
            println!(
                "permissive: los {} vertices (area {:.1})",
                permissive.los.vertex_count(),
                permissive.los.area(),
            );
        }
        Commands::Fixture { file, out, name } => {
            let capture =
                ReproCapture::load(&file).with_context(|| format!("loading capture {file}"))?;
            let scene = TestScene::from_capture(name, &capture);
            scene
                .save(&out)
                .with_context(|| format!("writing fixture {out}"))?;
            println!("wrote fixture {out} ({} walls)", scene.walls.len());
        }
    }

    Ok(())
}
