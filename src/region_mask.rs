// src/region_mask.rs

use crate::types::{FrameEdge, RoiConfig, RowAnchor};
use anyhow::Result;
use opencv::{
    core::{self, Mat, Vector},
    imgproc,
    prelude::*,
};

/// Keeps only the pixels inside the configured polygon.
pub struct RegionMasker {
    config: RoiConfig,
}

impl RegionMasker {
    pub fn new(config: RoiConfig) -> Self {
        Self { config }
    }

    /// Polygon vertices in pixel coordinates for a frame of the given size.
    pub fn polygon(&self, width: i32, height: i32) -> Vec<core::Point> {
        let (sx, sy) = match self.config.reference_resolution {
            Some([ref_w, ref_h]) => (width as f64 / ref_w as f64, height as f64 / ref_h as f64),
            None => (1.0, 1.0),
        };

        self.config
            .vertices
            .iter()
            .map(|v| {
                let y = match v.y {
                    RowAnchor::Row(row) => (row as f64 * sy) as i32,
                    RowAnchor::Edge(FrameEdge::Top) => 0,
                    RowAnchor::Edge(FrameEdge::Bottom) => height,
                };
                core::Point::new((v.x as f64 * sx) as i32, y)
            })
            .collect()
    }

    /// Binary mask (255 inside, 0 outside) matching `image` in size and type.
    pub fn build_mask(&self, image: &Mat) -> Result<Mat> {
        let mut mask =
            Mat::new_size_with_default(image.size()?, image.typ(), core::Scalar::all(0.0))?;

        let mut polygons = Vector::<Vector<core::Point>>::new();
        polygons.push(Vector::from_iter(self.polygon(image.cols(), image.rows())));

        imgproc::fill_poly(
            &mut mask,
            &polygons,
            core::Scalar::all(255.0),
            imgproc::LINE_8,
            0,
            core::Point::new(0, 0),
        )?;

        Ok(mask)
    }

    pub fn apply(&self, edges: &Mat) -> Result<Mat> {
        let mask = self.build_mask(edges)?;
        let mut masked = Mat::default();
        core::bitwise_and(edges, &mask, &mut masked, &core::no_array())?;
        Ok(masked)
    }
}
