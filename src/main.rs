use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use offscreen3d::render::SoftwareRenderer;
use offscreen3d::scene::demo::beam_and_ball;
use offscreen3d::{CaptureConfig, CaptureDriver, Engine};

/// Records the beam-and-ball demo from two orbiting cameras.
#[derive(Parser, Debug)]
#[command(name = "offscreen3d", version, about)]
struct Cli {
    /// JSON run configuration. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated duration in seconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Frames per simulated second.
    #[arg(long)]
    fps: Option<u32>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Anti-aliasing samples per pixel.
    #[arg(long)]
    samples: Option<u32>,

    /// Camera path radii along z and x.
    #[arg(long, num_args = 2, value_names = ["A", "B"])]
    ellipse: Option<Vec<f64>>,

    /// Root directory for the per-view frame directories.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<CaptureConfig> {
        let mut config = match &self.config {
            Some(path) => CaptureConfig::from_json_file(path)?,
            None => CaptureConfig::default(),
        };
        if let Some(duration) = self.duration {
            config.simulation_time = duration;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(width) = self.width {
            config.resolution[0] = width;
        }
        if let Some(height) = self.height {
            config.resolution[1] = height;
        }
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some([a, b]) = self.ellipse.as_deref() {
            config.ellipse = [*a, *b];
        }
        if let Some(root) = &self.output {
            config.set_output_root(root);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config()?;
    let fps = config.fps;
    let ext = config.image_extension.clone();

    let scene = beam_and_ball().context("cannot build the demo scene")?;
    let engine = Engine::new(SoftwareRenderer::default());
    let mut driver = CaptureDriver::new(engine, config).context("invalid run configuration")?;
    let summary = driver.run(scene)?;

    println!(
        "{} frames written, {:.2} s simulated",
        summary.total_files(),
        summary.simulated_time
    );
    for view in &summary.views {
        println!("To assemble '{}' into a video:", view.label);
        println!(
            "  ffmpeg -framerate {fps} -i {}/frame_%d.{ext} -c:v libx264 -pix_fmt yuv420p {}.mp4",
            view.output_dir.display(),
            view.label
        );
    }
    Ok(())
}
