use anyhow::{Context, Result};
use clap::Parser;
use deflection_vision::core_modules::utils::image_helper::image_helper::save_mask;
use deflection_vision::{Command, CommandOutcome, DeflectionPipeline, PipelineConfig};
use std::path::PathBuf;

/// Feeds a sequence of still frames through the deflection pipeline and prints
/// one JSON report per frame.
#[derive(Parser, Debug)]
#[command(name = "deflection_runner")]
#[command(version)]
struct Cli {
    /// Frame images, processed in the order given.
    #[arg(required = true)]
    frames: Vec<PathBuf>,

    /// Pipeline configuration (JSON). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Capture the reference pose after processing this frame index.
    #[arg(long)]
    capture_at: Option<usize>,

    /// Clear the reference pose after processing this frame index.
    #[arg(long)]
    reset_at: Option<usize>,

    /// Directory to write each frame's binary mask into, as PNG.
    #[arg(long)]
    mask_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // --- 1. Argument Parsing & Setup ---
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.mask_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating mask directory {}", dir.display()))?;
    }

    // --- 2. Pipeline Initialization ---
    let mut pipeline = DeflectionPipeline::new(config)?;

    // --- 3. Main Processing Loop ---
    for (index, path) in cli.frames.iter().enumerate() {
        // An unreadable frame is skipped; the pipeline is not invoked for it.
        let frame = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                tracing::warn!("skipping frame {} ({}): {}", index, path.display(), e);
                continue;
            }
        };

        // --- 4. Pipeline Processing ---
        let report = pipeline.process_frame(&frame)?;
        println!("{}", serde_json::to_string(&report)?);

        if let (Some(dir), Some(mask)) = (&cli.mask_dir, pipeline.last_mask()) {
            let mask_path = dir.join(format!("mask_{:05}.png", index));
            save_mask(&mask_path, mask)
                .with_context(|| format!("writing mask {}", mask_path.display()))?;
        }

        // --- 5. Commands ---
        if cli.reset_at == Some(index) {
            pipeline.apply(Command::ResetReference);
        }
        if cli.capture_at == Some(index) {
            match pipeline.apply(Command::CaptureReference) {
                CommandOutcome::ReferenceCaptured { points } => {
                    tracing::info!("frame {}: reference captured with {} points", index, points)
                }
                outcome => tracing::warn!("frame {}: {:?}", index, outcome),
            }
        }
    }

    tracing::info!("processing complete, {} frames", cli.frames.len());
    Ok(())
}
