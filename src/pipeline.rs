// src/pipeline.rs
//
// Per-frame lane pipeline:
//
//   Frame → EdgeExtractor → RegionMasker → LineDetector → LaneAggregator → LaneRenderer
//
// Nothing is carried from one frame to the next.

use crate::edge_extraction::EdgeExtractor;
use crate::lane_aggregation::LaneAggregator;
use crate::line_detection::{HoughLineDetector, LineDetector};
use crate::region_mask::RegionMasker;
use crate::renderer::LaneRenderer;
use crate::types::{Config, LaneDetection};
use anyhow::Result;
use opencv::{core::Mat, prelude::*};
use tracing::debug;

pub struct FrameResult {
    pub composite: Mat,
    pub lanes: LaneDetection,
    pub segment_count: usize,
}

/// What to show for a frame: the overlay, or the untouched input when a stage failed.
pub enum FrameOutcome {
    Processed(FrameResult),
    Passthrough { frame: Mat, error: anyhow::Error },
}

impl FrameOutcome {
    pub fn image(&self) -> &Mat {
        match self {
            FrameOutcome::Processed(result) => &result.composite,
            FrameOutcome::Passthrough { frame, .. } => frame,
        }
    }
}

pub struct LanePipeline<D = HoughLineDetector> {
    extractor: EdgeExtractor,
    masker: RegionMasker,
    detector: D,
    aggregator: LaneAggregator,
    renderer: LaneRenderer,
}

impl LanePipeline<HoughLineDetector> {
    pub fn new(config: &Config) -> Self {
        Self::with_detector(config, HoughLineDetector::new(config.hough.clone()))
    }
}

impl<D: LineDetector> LanePipeline<D> {
    pub fn with_detector(config: &Config, detector: D) -> Self {
        Self {
            extractor: EdgeExtractor::new(config.edges.clone()),
            masker: RegionMasker::new(config.roi.clone()),
            detector,
            aggregator: LaneAggregator::new(&config.lanes),
            renderer: LaneRenderer::new(config.render.clone()),
        }
    }

    /// Everything up to and including aggregation; no drawing.
    pub fn detect_lanes(&self, frame: &Mat) -> Result<(LaneDetection, usize)> {
        let edges = self.extractor.extract(frame)?;
        let cropped = self.masker.apply(&edges)?;
        let segments = self.detector.detect(&cropped)?;
        let lanes = self.aggregator.aggregate(&segments, frame.rows());

        debug!(
            "{} segment(s) → left: {:?}, right: {:?}",
            segments.len(),
            lanes.left,
            lanes.right
        );

        Ok((lanes, segments.len()))
    }

    pub fn process_frame(&self, frame: &Mat) -> Result<FrameResult> {
        let (lanes, segment_count) = self.detect_lanes(frame)?;
        let composite = self.renderer.composite(frame, &lanes.lines())?;

        Ok(FrameResult {
            composite,
            lanes,
            segment_count,
        })
    }

    /// Never fails: a frame whose processing errors is handed back unchanged
    /// together with the error, so playback can continue.
    pub fn process_or_passthrough(&self, frame: Mat) -> FrameOutcome {
        match self.process_frame(&frame) {
            Ok(result) => FrameOutcome::Processed(result),
            Err(error) => FrameOutcome::Passthrough { frame, error },
        }
    }
}
