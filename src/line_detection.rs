// src/line_detection.rs

use crate::types::{HoughConfig, Segment};
use anyhow::Result;
use opencv::{
    core::{self, Mat, Vector},
    imgproc,
};

/// Produces candidate segments from a binary edge map. An empty result is a
/// normal outcome, not an error.
pub trait LineDetector {
    fn detect(&self, edges: &Mat) -> Result<Vec<Segment>>;
}

/// Probabilistic Hough transform.
pub struct HoughLineDetector {
    config: HoughConfig,
}

impl HoughLineDetector {
    pub fn new(config: HoughConfig) -> Self {
        Self { config }
    }
}

impl LineDetector for HoughLineDetector {
    fn detect(&self, edges: &Mat) -> Result<Vec<Segment>> {
        let mut lines = Vector::<core::Vec4i>::new();
        imgproc::hough_lines_p(
            edges,
            &mut lines,
            self.config.rho,
            self.config.theta_degrees.to_radians(),
            self.config.threshold,
            self.config.min_line_length,
            self.config.max_line_gap,
        )?;

        Ok(lines
            .iter()
            .map(|l| Segment::new(l[0], l[1], l[2], l[3]))
            .collect())
    }
}
