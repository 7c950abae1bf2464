// src/lib.rs
//
// Straight lane-line detection for road video.
//
// Each frame runs through a stateless pipeline:
//
//   edge_extraction → region_mask → line_detection → lane_aggregation → renderer
//
// `pipeline::LanePipeline::process_frame` is the entry point for any driver;
// `video_processor` and `display` provide the one used by the binary.

pub mod config;
pub mod display;
pub mod edge_extraction;
pub mod error;
pub mod lane_aggregation;
pub mod line_detection;
pub mod pipeline;
pub mod region_mask;
pub mod renderer;
pub mod types;
pub mod video_processor;

pub use error::LaneError;
pub use line_detection::{HoughLineDetector, LineDetector};
pub use pipeline::{FrameOutcome, FrameResult, LanePipeline};
pub use types::{Config, LaneDetection, LaneLine, LaneSide, LaneStatus, LineParameters, Segment};
