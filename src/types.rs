// src/types.rs

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub edges: EdgeConfig,
    pub roi: RoiConfig,
    pub hough: HoughConfig,
    pub lanes: LaneGeometryConfig,
    pub render: RenderConfig,
    pub video: VideoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Side of the square Gaussian kernel (odd).
    pub blur_kernel: i32,
    pub blur_sigma: f64,
    pub canny_low: f64,
    pub canny_high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    pub vertices: Vec<RoiVertex>,
    /// Resolution the vertices were authored for. When set, vertices are
    /// rescaled to the frame being processed.
    pub reference_resolution: Option<[i32; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiVertex {
    pub x: i32,
    pub y: RowAnchor,
}

/// Vertical position of an ROI vertex: either an absolute row or pinned to
/// a frame edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowAnchor {
    Row(i32),
    Edge(FrameEdge),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameEdge {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    /// Distance resolution of the accumulator in pixels.
    pub rho: f64,
    /// Angle resolution of the accumulator in degrees.
    pub theta_degrees: f64,
    /// Minimum number of votes for a line.
    pub threshold: i32,
    pub min_line_length: f64,
    pub max_line_gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneGeometryConfig {
    /// Upper endpoint of each lane line, as a fraction of frame height.
    pub top_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub color_bgr: [f64; 3],
    pub thickness: i32,
    pub frame_weight: f64,
    pub line_weight: f64,
    pub bias: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Video file, directory of videos, or capture device index.
    pub input: String,
    pub output_dir: String,
    pub display: bool,
    pub save_annotated: bool,
    pub save_lanes_jsonl: bool,
    pub quit_key: char,
    pub poll_interval_ms: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Raw line segment as returned by the line detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Segment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

/// `y = slope * x + intercept` in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineParameters {
    pub slope: f64,
    pub intercept: f64,
}

impl LineParameters {
    pub fn x_at(&self, y: f64) -> f64 {
        (y - self.intercept) / self.slope
    }
}

/// Reconstructed lane boundary, bottom endpoint first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneLine {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneSide {
    Left,
    Right,
}

impl std::fmt::Display for LaneSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneSide::Left => write!(f, "left"),
            LaneSide::Right => write!(f, "right"),
        }
    }
}

/// Outcome for one side of the road in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaneStatus {
    Detected {
        line: LaneLine,
        params: LineParameters,
        /// Number of segments averaged into this line.
        support: usize,
    },
    /// No segment fell into this side's bucket.
    Undetermined,
    /// Averaged fit cannot be projected (horizontal or non-finite).
    Degenerate { slope: f64 },
}

impl LaneStatus {
    pub fn line(&self) -> Option<LaneLine> {
        match self {
            LaneStatus::Detected { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, LaneStatus::Detected { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneDetection {
    pub left: LaneStatus,
    pub right: LaneStatus,
}

impl LaneDetection {
    pub fn undetermined() -> Self {
        Self {
            left: LaneStatus::Undetermined,
            right: LaneStatus::Undetermined,
        }
    }

    pub fn side(&self, side: LaneSide) -> &LaneStatus {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Right => &self.right,
        }
    }

    /// Lines that should be drawn, left first.
    pub fn lines(&self) -> Vec<LaneLine> {
        [self.left.line(), self.right.line()]
            .into_iter()
            .flatten()
            .collect()
    }
}
