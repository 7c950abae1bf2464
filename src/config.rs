// src/config.rs

use crate::error::LaneError;
use crate::types::{
    Config, EdgeConfig, FrameEdge, HoughConfig, LaneGeometryConfig, LoggingConfig, RenderConfig,
    RoiConfig, RoiVertex, RowAnchor, VideoConfig,
};
use anyhow::Result;
use std::fs;
use std::path::Path;

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), LaneError> {
        let invalid =
            |msg: String| -> Result<(), LaneError> { Err(LaneError::InvalidConfig(msg)) };

        if self.roi.vertices.len() < 3 {
            return invalid(format!(
                "roi.vertices needs at least 3 points, got {}",
                self.roi.vertices.len()
            ));
        }
        if let Some([w, h]) = self.roi.reference_resolution {
            if w <= 0 || h <= 0 {
                return invalid(format!(
                    "roi.reference_resolution {}x{} must be positive",
                    w, h
                ));
            }
        }
        if self.edges.blur_kernel <= 0 || self.edges.blur_kernel % 2 == 0 {
            return invalid(format!(
                "edges.blur_kernel must be a positive odd number, got {}",
                self.edges.blur_kernel
            ));
        }
        if self.edges.canny_low > self.edges.canny_high {
            return invalid(format!(
                "edges.canny_low ({}) exceeds edges.canny_high ({})",
                self.edges.canny_low, self.edges.canny_high
            ));
        }
        if self.hough.rho <= 0.0 || self.hough.theta_degrees <= 0.0 {
            return invalid("hough.rho and hough.theta_degrees must be positive".to_string());
        }
        if self.hough.threshold < 1 {
            return invalid(format!(
                "hough.threshold must be at least 1, got {}",
                self.hough.threshold
            ));
        }
        if self.hough.min_line_length < 0.0 || self.hough.max_line_gap < 0.0 {
            return invalid(format!(
                "hough.min_line_length ({}) and hough.max_line_gap ({}) must not be negative",
                self.hough.min_line_length, self.hough.max_line_gap
            ));
        }
        if !(self.lanes.top_ratio > 0.0 && self.lanes.top_ratio < 1.0) {
            return invalid(format!(
                "lanes.top_ratio must lie in (0, 1), got {}",
                self.lanes.top_ratio
            ));
        }
        if self.render.thickness < 1 {
            return invalid(format!(
                "render.thickness must be at least 1, got {}",
                self.render.thickness
            ));
        }
        Ok(())
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            blur_sigma: 0.0,
            canny_low: 50.0,
            canny_high: 150.0,
        }
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            vertices: vec![
                RoiVertex {
                    x: 200,
                    y: RowAnchor::Edge(FrameEdge::Bottom),
                },
                RoiVertex {
                    x: 1100,
                    y: RowAnchor::Edge(FrameEdge::Bottom),
                },
                RoiVertex {
                    x: 550,
                    y: RowAnchor::Row(250),
                },
            ],
            reference_resolution: None,
        }
    }
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            rho: 2.0,
            theta_degrees: 1.0,
            threshold: 100,
            min_line_length: 40.0,
            max_line_gap: 5.0,
        }
    }
}

impl Default for LaneGeometryConfig {
    fn default() -> Self {
        Self { top_ratio: 0.6 }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            color_bgr: [255.0, 0.0, 0.0],
            thickness: 10,
            frame_weight: 0.8,
            line_weight: 1.0,
            bias: 1.0,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            input: "test2.mp4".to_string(),
            output_dir: "output".to_string(),
            display: true,
            save_annotated: false,
            save_lanes_jsonl: false,
            quit_key: 'q',
            poll_interval_ms: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "lane_lines=info".to_string(),
        }
    }
}
