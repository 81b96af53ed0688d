//! Runs the motion tracker over a directory of frames.

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info, warn};
use motion_tracker::core_modules::overlay;
use motion_tracker::core_modules::utils::image_helper::image_helper;
use motion_tracker::pipeline::{
    AreaRange, DetectionOptions, FrameStatus, MotionPipeline, PipelineConfig,
};
use motion_tracker::{Frame, MotionError};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "motion_tracker",
    version,
    about = "Detects moving regions in an image sequence and reports the direction of motion"
)]
struct Args {
    /// Directory holding the frames; files are processed in name order
    input: PathBuf,
    /// Directory to write overlay images to
    #[arg(long, short, value_name = "DIR")]
    output: Option<PathBuf>,
    /// Also write the motion mask of every frame (requires --output)
    #[arg(long, requires = "output")]
    save_masks: bool,
    /// JSON pipeline configuration; flags below override it
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Exclusive lower area bound of a detected region
    #[arg(long)]
    min_area: Option<f64>,
    /// Exclusive upper area bound of a detected region
    #[arg(long)]
    max_area: Option<f64>,
    /// Motion history capacity, at least the frame rate
    #[arg(long)]
    history: Option<usize>,
    /// Per-channel difference cutoff
    #[arg(long)]
    threshold: Option<u8>,
    /// Keep only the largest region
    #[arg(long)]
    largest: bool,
    /// Keep only the smallest region
    #[arg(long)]
    smallest: bool,
    /// Keep regions outside the area range instead of inside it
    #[arg(long)]
    outside_range: bool,
    /// Keep every region regardless of size
    #[arg(long, conflicts_with_all = ["largest", "smallest", "outside_range"])]
    all: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let frames = list_frames(&args.input)?;
    if frames.is_empty() {
        bail!("no images found in {}", args.input.display());
    }

    if let Some(output) = &args.output {
        std::fs::create_dir_all(output)
            .with_context(|| format!("creating {}", output.display()))?;
    }

    let mut pipeline = MotionPipeline::new(config)?;
    debug!("pipeline configuration: {:?}", pipeline.config());
    let mut frames_in_motion = 0usize;

    for path in &frames {
        let image = image::open(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let analysis = match pipeline.ingest_frame(Frame::from(image)) {
            Ok(analysis) => analysis,
            Err(err @ MotionError::InputShapeMismatch { .. }) => {
                warn!("{name}: skipped, {err}");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        match (analysis.status, analysis.direction) {
            (FrameStatus::Tracked, Some(direction)) => {
                frames_in_motion += 1;
                info!(
                    "{name}: {} object(s), moving {direction} (translation {:.1}, {:.1})",
                    analysis.objects.len(),
                    analysis.translation.x,
                    analysis.translation.y
                );
                if let Some((dx, dy)) = analysis.center_offset {
                    info!("{name}: offset from center {dx:.1}, {dy:.1}");
                }
            }
            (status, _) => info!("{name}: no motion ({status:?})"),
        }

        let Some(output) = &args.output else {
            continue;
        };
        if analysis.status == FrameStatus::WarmingUp {
            continue;
        }
        if let Some(middle) = pipeline.middle_frame() {
            let canvas = overlay::render(middle, &analysis);
            image_helper::save_rgb(&output.join(format!("{name}.png")), &canvas)?;
        }
        if args.save_masks {
            if let Some(mask) = pipeline.last_mask() {
                image_helper::save_mask(&output.join(format!("{name}_mask.png")), mask)?;
            }
        }
    }

    info!(
        "processed {} frames, motion in {frames_in_motion}",
        pipeline.frames_ingested()
    );
    Ok(())
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };

    let AreaRange { min, max } = config.area_range;
    config.area_range = AreaRange::new(args.min_area.unwrap_or(min), args.max_area.unwrap_or(max));
    if let Some(history) = args.history {
        config.history_capacity = history;
    }
    if let Some(threshold) = args.threshold {
        config.mask_threshold = threshold;
    }

    if args.all {
        config.detection_options = DetectionOptions::ALL;
    } else {
        if args.outside_range {
            config.detection_options.in_range = false;
            config.detection_options.out_of_range = true;
        }
        if args.largest {
            config.detection_options |= DetectionOptions::LARGEST;
        }
        if args.smallest {
            config.detection_options |= DetectionOptions::SMALLEST;
        }
    }

    config.validate()?;
    Ok(config)
}

#[cfg(feature = "serde")]
fn load_config(path: &Path) -> Result<PipelineConfig> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

#[cfg(not(feature = "serde"))]
fn load_config(path: &Path) -> Result<PipelineConfig> {
    bail!(
        "cannot load {}: built without the `serde` feature",
        path.display()
    )
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}
