use anyhow::{Context, Result};
use clap::Parser;
use dumpwatch::core_modules::detection_log::read_frames_dir;
use dumpwatch::pipeline::{EventPipeline, PipelineConfig, Report};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Replay a directory of detection logs (one file per frame) and print the
/// dumping and violence events each frame produces.
#[derive(Parser, Debug)]
#[command(name = "log_replayer", version, about, long_about = None)]
struct Cli {
    /// Directory holding one `class_id track_id x y w h` file per frame
    input: PathBuf,

    /// Max center distance for a person to be related to trash
    #[arg(long)]
    distance: Option<f64>,

    /// Frames an unrefreshed identity is remembered for
    #[arg(long)]
    release: Option<u32>,

    /// IOU above which a trash box is folded onto a remembered identity
    #[arg(long)]
    iou: Option<f64>,

    /// Skip the violence check
    #[arg(long)]
    no_violence: bool,

    /// Print one JSON report per frame instead of text
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::from_env();
        if let Some(distance) = self.distance {
            config.dumping.distance_threshold = distance;
        }
        if let Some(release) = self.release {
            config.dumping.release_threshold = release;
        }
        if let Some(iou) = self.iou {
            config.dumping.iou_threshold = iou;
        }
        if self.no_violence {
            config.violence_enabled = false;
        }
        config
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dumpwatch=info,log_replayer=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // --- 1. Pipeline Initialization ---
    let config = cli.pipeline_config();
    info!(?config, "replaying {}", cli.input.display());
    let mut pipeline = EventPipeline::new(config).context("invalid pipeline configuration")?;

    // --- 2. Load Recording ---
    let frames = read_frames_dir(&cli.input).with_context(|| format!("failed to load {}", cli.input.display()))?;

    // --- 3. Main Processing Loop ---
    let mut event_frames = 0usize;
    for (path, frame) in &frames {
        let report = pipeline.process_frame(frame);
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

        if cli.json {
            let line = serde_json::json!({ "file": name, "report": report });
            println!("{line}");
        } else {
            match &report {
                Report::NoEvent => println!("{name} : []"),
                Report::Events(events) => {
                    println!("{name} : dumping={:?} violence={:?}", events.dumping, events.violence)
                }
            }
        }
        if report.is_event() {
            event_frames += 1;
        }
    }

    info!(frames = frames.len(), event_frames, "replay complete");
    Ok(())
}
