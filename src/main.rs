// src/main.rs

use anyhow::Result;
use clap::Parser;
use lane_lines::display::DisplayWindow;
use lane_lines::video_processor::{FrameRecord, VideoProcessor, VideoSource};
use lane_lines::{Config, FrameOutcome, LaneDetection, LanePipeline, LaneSide, LaneStatus};
use opencv::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lane-lines")]
#[command(about = "Detect straight lane lines in road video and overlay them on each frame")]
#[command(version)]
struct Cli {
    /// Video file, directory of videos, or capture device index.
    input: Option<String>,

    /// Path to the YAML configuration.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Process without opening a display window.
    #[arg(long)]
    no_display: bool,

    /// Write an annotated copy of every processed video.
    #[arg(long)]
    save_annotated: bool,

    /// Write per-frame lane lines as JSON lines.
    #[arg(long)]
    save_lanes: bool,

    /// Directory for annotated videos and lane logs.
    #[arg(long)]
    output_dir: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.video.input = input.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.video.output_dir = dir.clone();
        }
        if self.no_display {
            config.video.display = false;
        }
        if self.save_annotated {
            config.video.save_annotated = true;
        }
        if self.save_lanes {
            config.video.save_lanes_jsonl = true;
        }
    }
}

#[derive(Debug, Default)]
struct ProcessingStats {
    total_frames: u64,
    both_lanes: u64,
    left_only: u64,
    right_only: u64,
    no_lanes: u64,
    degenerate_sides: u64,
    failed_frames: u64,
    stopped_by_user: bool,
    duration_secs: f64,
    avg_fps: f64,
}

impl ProcessingStats {
    fn record(&mut self, lanes: &LaneDetection) {
        match (lanes.left.is_detected(), lanes.right.is_detected()) {
            (true, true) => self.both_lanes += 1,
            (true, false) => self.left_only += 1,
            (false, true) => self.right_only += 1,
            (false, false) => self.no_lanes += 1,
        }
        for side in [LaneSide::Left, LaneSide::Right] {
            if let LaneStatus::Degenerate { slope } = lanes.side(side) {
                debug!("{} lane degenerate (slope {})", side, slope);
                self.degenerate_sides += 1;
            }
        }
    }

    fn log_summary(&self) {
        let pct = |n: u64| 100.0 * n as f64 / self.total_frames.max(1) as f64;

        info!("  Total frames: {}", self.total_frames);
        info!("  Both lanes: {} ({:.1}%)", self.both_lanes, pct(self.both_lanes));
        info!("  Left only: {} ({:.1}%)", self.left_only, pct(self.left_only));
        info!("  Right only: {} ({:.1}%)", self.right_only, pct(self.right_only));
        info!("  No lanes: {} ({:.1}%)", self.no_lanes, pct(self.no_lanes));
        if self.degenerate_sides > 0 {
            warn!("  Degenerate lane fits: {}", self.degenerate_sides);
        }
        if self.failed_frames > 0 {
            warn!("  Frames shown without overlay after errors: {}", self.failed_frames);
        }
        if self.stopped_by_user {
            info!("  Stopped by user");
        }
        info!(
            "  Duration: {:.1}s, processing speed: {:.1} FPS",
            self.duration_secs, self.avg_fps
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply(&mut config);
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚗 Lane line detection starting");
    if cli.config.exists() {
        info!("✓ Configuration loaded from {}", cli.config.display());
    } else {
        warn!(
            "Config file {} not found, using built-in defaults",
            cli.config.display()
        );
    }

    let pipeline = LanePipeline::new(&config);
    let video_processor = VideoProcessor::new(config.video.clone());
    let sources = video_processor.resolve_sources()?;

    if sources.is_empty() {
        error!("No video files found in {}", config.video.input);
        return Ok(());
    }

    let window = if config.video.display {
        Some(DisplayWindow::open(
            "result",
            config.video.quit_key,
            config.video.poll_interval_ms,
        )?)
    } else {
        None
    };

    for (idx, source) in sources.iter().enumerate() {
        info!(
            "Processing video {}/{}: {}",
            idx + 1,
            sources.len(),
            source.name()
        );

        match process_video(source, &pipeline, &video_processor, window.as_ref()) {
            Ok(stats) => {
                info!("✓ Video processed");
                stats.log_summary();

                if stats.stopped_by_user {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to process video: {}", e);
                if sources.len() == 1 {
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}

fn process_video(
    source: &VideoSource,
    pipeline: &LanePipeline,
    video_processor: &VideoProcessor,
    window: Option<&DisplayWindow>,
) -> Result<ProcessingStats> {
    let start_time = Instant::now();
    let mut stats = ProcessingStats::default();

    let mut reader = video_processor.open_video(source)?;
    let mut writer = video_processor
        .create_writer(source, &reader)
        .unwrap_or_else(|e| {
            warn!("Annotated output disabled: {}", e);
            None
        });
    let mut lane_log = video_processor.create_lane_log(source).unwrap_or_else(|e| {
        warn!("Lane log disabled: {}", e);
        None
    });

    loop {
        let frame = match reader.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                warn!(
                    "Frame {}: read failed, ending stream: {}",
                    reader.current_frame, e
                );
                break;
            }
        };
        stats.total_frames += 1;

        let outcome = pipeline.process_or_passthrough(frame);
        match &outcome {
            FrameOutcome::Processed(result) => {
                stats.record(&result.lanes);

                if let Some(log) = lane_log.as_mut() {
                    let record = FrameRecord {
                        frame: reader.current_frame,
                        timestamp_ms: reader.timestamp_ms(),
                        segments: result.segment_count,
                        lanes: &result.lanes,
                    };
                    if let Err(e) = log.record(&record) {
                        warn!("Lane log disabled after write error: {}", e);
                        lane_log = None;
                    }
                }
            }
            FrameOutcome::Passthrough { error, .. } => {
                warn!("Frame {}: {}", reader.current_frame, error);
                stats.failed_frames += 1;
            }
        }
        let output = outcome.image();

        if let Some(w) = writer.as_mut() {
            if let Err(e) = w.write(output) {
                warn!("Annotated output disabled after write error: {}", e);
                writer = None;
            }
        }

        if stats.total_frames % 100 == 0 {
            debug!(
                "Frame {} ({:.1}%)",
                reader.current_frame,
                reader.progress()
            );
        }

        if let Some(window) = window {
            if window.show(output)? {
                stats.stopped_by_user = true;
                break;
            }
        }
    }

    if let Some(log) = lane_log.as_mut() {
        if let Err(e) = log.flush() {
            warn!("Failed to flush lane log: {}", e);
        }
    }

    stats.duration_secs = start_time.elapsed().as_secs_f64();
    stats.avg_fps = stats.total_frames as f64 / stats.duration_secs.max(1e-6);

    Ok(stats)
}
