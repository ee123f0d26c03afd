//! Render one frame of the sphere, in a window or to a PNG file.
//!
//! Run with:
//!     cargo run --bin sphere-frame
//!     cargo run --bin sphere-frame -- --headless --output sphere.png

use anyhow::{Context, Result};
use clap::Parser;
use sphere_frame::{parse_hex_color, render_to_png, run_window, GpuOptions, SceneConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sphere-frame", version, about = "Draw a single frame of a sphere with wgpu")]
struct Args {
    /// Scene config (JSON). Command line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render offscreen instead of opening a window.
    #[arg(long)]
    headless: bool,

    /// PNG path for headless output.
    #[arg(long, default_value = "sphere.png")]
    output: PathBuf,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Clear color as #rrggbb or #rrggbbaa.
    #[arg(long)]
    clear_color: Option<String>,
}

impl Args {
    fn scene(&self) -> Result<SceneConfig> {
        let mut scene = match &self.config {
            Some(path) => SceneConfig::from_json_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => SceneConfig::default(),
        };
        if let Some(width) = self.width {
            scene.width = width;
        }
        if let Some(height) = self.height {
            scene.height = height;
        }
        if let Some(hex) = &self.clear_color {
            scene.clear_color =
                parse_hex_color(hex).with_context(|| format!("invalid clear color '{hex}'"))?;
        }
        scene.validate()?;
        Ok(scene)
    }
}

fn run(args: Args) -> Result<()> {
    let scene = args.scene()?;
    let options = GpuOptions::from_env();

    if args.headless {
        let frame = pollster::block_on(render_to_png(&scene, options, &args.output))?;
        log::info!(
            "Rendered {}x{} on '{}' -> {}",
            frame.image.width,
            frame.image.height,
            frame.adapter,
            args.output.display()
        );
    } else if let Some(frame) = run_window(scene, options)? {
        log::info!("Window frame reached {}", frame.state);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Args::parse()) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
