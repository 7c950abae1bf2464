// src/video_processor.rs

use crate::error::LaneError;
use crate::types::{LaneDetection, VideoConfig};
use anyhow::Result;
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst, VideoWriter},
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    File(PathBuf),
    Device(i32),
}

impl VideoSource {
    pub fn name(&self) -> String {
        match self {
            VideoSource::File(path) => path.display().to_string(),
            VideoSource::Device(index) => format!("device {}", index),
        }
    }

    /// File stem used to name output artifacts.
    pub fn stem(&self) -> String {
        match self {
            VideoSource::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "video".to_string()),
            VideoSource::Device(index) => format!("device{}", index),
        }
    }
}

fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub struct VideoProcessor {
    config: VideoConfig,
}

impl VideoProcessor {
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }

    /// Expand the configured input into concrete sources: a directory becomes
    /// every video under it, an integer that is not an existing path becomes
    /// a capture device.
    pub fn resolve_sources(&self) -> Result<Vec<VideoSource>> {
        let input = Path::new(&self.config.input);

        if input.is_dir() {
            return self.find_video_files(input);
        }
        if !input.exists() {
            if let Ok(index) = self.config.input.trim().parse::<i32>() {
                return Ok(vec![VideoSource::Device(index)]);
            }
        }
        Ok(vec![VideoSource::File(input.to_path_buf())])
    }

    pub fn find_video_files(&self, dir: &Path) -> Result<Vec<VideoSource>> {
        let mut videos: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && is_video_file(p))
            .collect();
        videos.sort();

        info!("Found {} video files in {}", videos.len(), dir.display());
        Ok(videos.into_iter().map(VideoSource::File).collect())
    }

    pub fn open_video(&self, source: &VideoSource) -> Result<VideoReader> {
        info!("Opening video: {}", source.name());

        let cap = match source {
            VideoSource::File(path) => {
                VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?
            }
            VideoSource::Device(index) => VideoCapture::new(*index, videoio::CAP_ANY)?,
        };

        if !cap.is_opened()? {
            return Err(LaneError::VideoOpen {
                source_name: source.name(),
            }
            .into());
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        let total_frames =
            VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_COUNT)? as i32;
        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

        info!(
            "Video properties: {}x{} @ {:.1} FPS, {} frames",
            width, height, fps, total_frames
        );

        Ok(VideoReader {
            cap,
            fps,
            total_frames,
            current_frame: 0,
            width,
            height,
        })
    }

    fn output_path(&self, source: &VideoSource, suffix: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        Ok(PathBuf::from(&self.config.output_dir).join(format!("{}{}", source.stem(), suffix)))
    }

    pub fn create_writer(
        &self,
        source: &VideoSource,
        reader: &VideoReader,
    ) -> Result<Option<VideoWriter>> {
        if !self.config.save_annotated {
            return Ok(None);
        }

        let output_path = self.output_path(source, "_lanes.mp4")?;
        info!("Output video: {}", output_path.display());

        // capture devices frequently report 0 FPS
        let fps = if reader.fps > 0.0 { reader.fps } else { 30.0 };
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(
            &output_path.to_string_lossy(),
            fourcc,
            fps,
            core::Size::new(reader.width, reader.height),
            true,
        )?;

        if !writer.is_opened()? {
            warn!(
                "Could not open video writer for {}, annotated output disabled",
                output_path.display()
            );
            return Ok(None);
        }

        Ok(Some(writer))
    }

    pub fn create_lane_log(
        &self,
        source: &VideoSource,
    ) -> Result<Option<LaneLog<BufWriter<File>>>> {
        if !self.config.save_lanes_jsonl {
            return Ok(None);
        }

        let path = self.output_path(source, "_lanes.jsonl")?;
        info!("💾 Lane lines will be written to: {}", path.display());
        Ok(Some(LaneLog::new(BufWriter::new(File::create(path)?))))
    }
}

pub struct VideoReader {
    cap: VideoCapture,
    pub fps: f64,
    pub total_frames: i32,
    pub current_frame: i32,
    pub width: i32,
    pub height: i32,
}

impl VideoReader {
    /// Next BGR frame, or `None` once the stream is exhausted or a frame
    /// cannot be decoded.
    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut mat = Mat::default();

        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            return Ok(None);
        }

        self.current_frame += 1;
        Ok(Some(mat))
    }

    pub fn timestamp_ms(&self) -> f64 {
        if self.fps <= 0.0 {
            return 0.0;
        }
        (self.current_frame as f64 / self.fps) * 1000.0
    }

    pub fn progress(&self) -> f32 {
        if self.total_frames <= 0 {
            return 0.0;
        }
        (self.current_frame as f32 / self.total_frames as f32) * 100.0
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        if let Err(e) = self.cap.release() {
            warn!("Failed to release video source: {}", e);
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FrameRecord<'a> {
    pub frame: i32,
    pub timestamp_ms: f64,
    pub segments: usize,
    #[serde(flatten)]
    pub lanes: &'a LaneDetection,
}

/// One JSON object per processed frame.
pub struct LaneLog<W: Write> {
    out: W,
}

impl<W: Write> LaneLog<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn record(&mut self, record: &FrameRecord<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
