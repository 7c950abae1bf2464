// src/edge_extraction.rs

use crate::error::LaneError;
use crate::types::EdgeConfig;
use anyhow::Result;
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};

/// Grayscale -> Gaussian blur -> Canny.
pub struct EdgeExtractor {
    config: EdgeConfig,
}

impl EdgeExtractor {
    pub fn new(config: EdgeConfig) -> Self {
        Self { config }
    }

    /// Single-channel edge map (0 or 255) with the frame's dimensions.
    pub fn extract(&self, frame: &Mat) -> Result<Mat> {
        if frame.empty() {
            return Err(LaneError::EmptyFrame.into());
        }

        let gray = if frame.channels() == 1 {
            frame.try_clone()?
        } else {
            let mut gray = Mat::default();
            imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;
            gray
        };

        let k = self.config.blur_kernel;
        let mut blurred = Mat::default();
        imgproc::gaussian_blur(
            &gray,
            &mut blurred,
            core::Size::new(k, k),
            self.config.blur_sigma,
            0.0,
            core::BORDER_DEFAULT,
        )?;

        let mut edges = Mat::default();
        imgproc::canny(
            &blurred,
            &mut edges,
            self.config.canny_low,
            self.config.canny_high,
            3,
            false,
        )?;

        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dark frame with a bright vertical band starting at column `band_x`.
    fn banded_frame(rows: i32, cols: i32, band_x: i32) -> Mat {
        let mut frame =
            Mat::new_rows_cols_with_default(rows, cols, core::CV_8UC3, core::Scalar::all(0.0))
                .unwrap();
        imgproc::rectangle(
            &mut frame,
            core::Rect::new(band_x, 0, cols - band_x, rows),
            core::Scalar::all(255.0),
            -1,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
        frame
    }

    #[test]
    fn test_edge_map_shape() {
        let frame = banded_frame(120, 160, 80);
        let edges = EdgeExtractor::new(EdgeConfig::default())
            .extract(&frame)
            .unwrap();

        assert_eq!(edges.rows(), 120);
        assert_eq!(edges.cols(), 160);
        assert_eq!(edges.channels(), 1);
        assert_eq!(edges.typ(), core::CV_8UC1);
    }

    #[test]
    fn test_step_produces_edges_only_near_boundary() {
        let frame = banded_frame(120, 160, 80);
        let edges = EdgeExtractor::new(EdgeConfig::default())
            .extract(&frame)
            .unwrap();

        assert!(core::count_non_zero(&edges).unwrap() > 0);
        for row in 0..edges.rows() {
            for col in 0..edges.cols() {
                if *edges.at_2d::<u8>(row, col).unwrap() != 0 {
                    assert!((col - 80).abs() <= 3, "edge at column {}", col);
                }
            }
        }
    }

    #[test]
    fn test_uniform_frame_has_no_edges() {
        let frame =
            Mat::new_rows_cols_with_default(64, 64, core::CV_8UC3, core::Scalar::all(90.0))
                .unwrap();
        let edges = EdgeExtractor::new(EdgeConfig::default())
            .extract(&frame)
            .unwrap();
        assert_eq!(core::count_non_zero(&edges).unwrap(), 0);
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let result = EdgeExtractor::new(EdgeConfig::default()).extract(&Mat::default());
        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<LaneError>(),
            Some(&LaneError::EmptyFrame)
        );
    }
}
