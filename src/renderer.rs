// src/renderer.rs

use crate::types::{LaneLine, RenderConfig};
use anyhow::Result;
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};

pub struct LaneRenderer {
    config: RenderConfig,
}

impl LaneRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    fn color(&self) -> core::Scalar {
        let [b, g, r] = self.config.color_bgr;
        core::Scalar::new(b, g, r, 0.0)
    }

    /// Black canvas the size of `frame` with the lane lines drawn on it.
    pub fn draw_lines(&self, frame: &Mat, lines: &[LaneLine]) -> Result<Mat> {
        let mut canvas =
            Mat::new_size_with_default(frame.size()?, frame.typ(), core::Scalar::all(0.0))?;

        for line in lines {
            imgproc::line(
                &mut canvas,
                core::Point::new(line.x1, line.y1),
                core::Point::new(line.x2, line.y2),
                self.color(),
                self.config.thickness,
                imgproc::LINE_8,
                0,
            )?;
        }

        Ok(canvas)
    }

    /// `frame_weight * frame + line_weight * canvas + bias`, saturated.
    pub fn composite(&self, frame: &Mat, lines: &[LaneLine]) -> Result<Mat> {
        let canvas = self.draw_lines(frame, lines)?;

        let mut blended = Mat::default();
        core::add_weighted(
            frame,
            self.config.frame_weight,
            &canvas,
            self.config.line_weight,
            self.config.bias,
            &mut blended,
            -1,
        )?;

        Ok(blended)
    }
}
