// src/lane_aggregation.rs
//
// Turns raw Hough segments into one straight line per side of the road.
//
//   segments ──fit──► (slope, intercept) ──sign──► left / right bucket
//                                                      │
//                                      mean per bucket ▼
//                    bottom row ◄── project ── averaged (slope, intercept)
//
// Image y grows downward, so the left boundary rises to the right and has a
// negative slope. Slope 0 goes to the right bucket.

use crate::error::LaneError;
use crate::types::{
    LaneDetection, LaneGeometryConfig, LaneLine, LaneSide, LaneStatus, LineParameters, Segment,
};
use tracing::debug;

/// Degree-1 least-squares fit through the segment's endpoints, x as the
/// independent variable. `None` for vertical segments.
pub fn fit_segment(segment: &Segment) -> Option<LineParameters> {
    let (x1, y1) = (segment.x1 as f64, segment.y1 as f64);
    let (x2, y2) = (segment.x2 as f64, segment.y2 as f64);

    let dx = x2 - x1;
    if dx == 0.0 {
        return None;
    }

    let slope = (y2 - y1) / dx;
    let mean_x = (x1 + x2) / 2.0;
    let mean_y = (y1 + y2) / 2.0;

    Some(LineParameters {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

pub fn classify(params: &LineParameters) -> LaneSide {
    if params.slope < 0.0 {
        LaneSide::Left
    } else {
        LaneSide::Right
    }
}

/// Unweighted component-wise mean. `None` for an empty bucket.
pub fn average(fits: &[LineParameters]) -> Option<LineParameters> {
    if fits.is_empty() {
        return None;
    }

    let n = fits.len() as f64;
    let (slope_sum, intercept_sum) = fits
        .iter()
        .fold((0.0, 0.0), |(s, b), p| (s + p.slope, b + p.intercept));

    Some(LineParameters {
        slope: slope_sum / n,
        intercept: intercept_sum / n,
    })
}

/// Project a fitted line onto the bottom row and the row at
/// `frame_height * top_ratio`. Coordinates are truncated toward zero.
pub fn make_coordinates(
    side: LaneSide,
    params: &LineParameters,
    frame_height: i32,
    top_ratio: f64,
) -> Result<LaneLine, LaneError> {
    let degenerate = || LaneError::DegenerateGeometry {
        side,
        slope: params.slope,
    };

    if params.slope == 0.0 || !params.slope.is_finite() || !params.intercept.is_finite() {
        return Err(degenerate());
    }

    let y1 = frame_height;
    let y2 = (y1 as f64 * top_ratio) as i32;

    let x1 = params.x_at(y1 as f64);
    let x2 = params.x_at(y2 as f64);

    let representable = |x: f64| x.is_finite() && x >= i32::MIN as f64 && x <= i32::MAX as f64;
    if !representable(x1) || !representable(x2) {
        return Err(degenerate());
    }

    Ok(LaneLine {
        x1: x1 as i32,
        y1,
        x2: x2 as i32,
        y2,
    })
}

pub struct LaneAggregator {
    top_ratio: f64,
}

impl LaneAggregator {
    pub fn new(config: &LaneGeometryConfig) -> Self {
        Self {
            top_ratio: config.top_ratio,
        }
    }

    /// Split segments into per-side buckets of fitted line parameters.
    pub fn bucket(&self, segments: &[Segment]) -> (Vec<LineParameters>, Vec<LineParameters>) {
        let mut left_fit = Vec::new();
        let mut right_fit = Vec::new();

        for segment in segments {
            let Some(params) = fit_segment(segment) else {
                debug!("Skipping vertical segment {:?}", segment);
                continue;
            };

            match classify(&params) {
                LaneSide::Left => left_fit.push(params),
                LaneSide::Right => right_fit.push(params),
            }
        }

        (left_fit, right_fit)
    }

    pub fn aggregate(&self, segments: &[Segment], frame_height: i32) -> LaneDetection {
        let (left_fit, right_fit) = self.bucket(segments);

        LaneDetection {
            left: self.resolve_side(LaneSide::Left, &left_fit, frame_height),
            right: self.resolve_side(LaneSide::Right, &right_fit, frame_height),
        }
    }

    fn resolve_side(
        &self,
        side: LaneSide,
        fits: &[LineParameters],
        frame_height: i32,
    ) -> LaneStatus {
        let Some(params) = average(fits) else {
            return LaneStatus::Undetermined;
        };

        match make_coordinates(side, &params, frame_height, self.top_ratio) {
            Ok(line) => LaneStatus::Detected {
                line,
                params,
                support: fits.len(),
            },
            Err(e) => {
                debug!("{}", e);
                LaneStatus::Degenerate {
                    slope: params.slope,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> LaneAggregator {
        LaneAggregator::new(&LaneGeometryConfig::default())
    }

    #[test]
    fn test_fit_known_segment() {
        let params = fit_segment(&Segment::new(300, 700, 400, 500)).unwrap();
        assert!((params.slope - -2.0).abs() < 1e-12);
        assert!((params.intercept - 1300.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_is_endpoint_order_independent() {
        let a = fit_segment(&Segment::new(300, 700, 400, 500)).unwrap();
        let b = fit_segment(&Segment::new(400, 500, 300, 700)).unwrap();
        assert!((a.slope - b.slope).abs() < 1e-12);
        assert!((a.intercept - b.intercept).abs() < 1e-9);
    }

    #[test]
    fn test_fit_extreme_coordinates_does_not_overflow() {
        let params = fit_segment(&Segment::new(i32::MIN, i32::MAX, i32::MAX, i32::MIN)).unwrap();
        assert!((params.slope - -1.0).abs() < 1e-9);
        assert!(params.intercept.is_finite());

        let params = fit_segment(&Segment::new(i32::MAX - 10, 0, i32::MAX, 20)).unwrap();
        assert!((params.slope - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_segment_has_no_fit() {
        assert!(fit_segment(&Segment::new(500, 100, 500, 600)).is_none());

        let (left, right) = aggregator().bucket(&[Segment::new(500, 100, 500, 600)]);
        assert!(left.is_empty());
        assert!(right.is_empty());
    }

    #[test]
    fn test_classification_by_slope_sign() {
        let negative = LineParameters { slope: -0.7, intercept: 900.0 };
        let positive = LineParameters { slope: 0.7, intercept: -100.0 };
        let flat = LineParameters { slope: 0.0, intercept: 400.0 };

        assert_eq!(classify(&negative), LaneSide::Left);
        assert_eq!(classify(&positive), LaneSide::Right);
        assert_eq!(classify(&flat), LaneSide::Right);
    }

    #[test]
    fn test_bucket_routes_segments() {
        let segments = [
            Segment::new(300, 700, 400, 500), // rising to the right in image space -> left
            Segment::new(800, 500, 900, 700), // right
            Segment::new(100, 400, 300, 400), // horizontal -> right
        ];
        let (left, right) = aggregator().bucket(&segments);
        assert_eq!(left.len(), 1);
        assert_eq!(right.len(), 2);
        assert!(left.iter().all(|p| p.slope < 0.0));
        assert!(right.iter().all(|p| p.slope >= 0.0));
    }

    #[test]
    fn test_single_element_average_is_identity() {
        let p = LineParameters { slope: -1.25, intercept: 1034.5 };
        assert_eq!(average(&[p]), Some(p));
    }

    #[test]
    fn test_empty_average_is_none() {
        assert_eq!(average(&[]), None);
    }

    #[test]
    fn test_average_is_order_independent() {
        let fits = vec![
            LineParameters { slope: -0.9, intercept: 1100.0 },
            LineParameters { slope: -1.3, intercept: 1250.5 },
            LineParameters { slope: -0.4, intercept: 870.25 },
            LineParameters { slope: -2.1, intercept: 1490.0 },
        ];
        let mut reversed = fits.clone();
        reversed.reverse();
        let mut rotated = fits.clone();
        rotated.rotate_left(1);

        let base = average(&fits).unwrap();
        for permutation in [reversed, rotated] {
            let avg = average(&permutation).unwrap();
            assert!((avg.slope - base.slope).abs() < 1e-9);
            assert!((avg.intercept - base.intercept).abs() < 1e-9);
        }
        assert!((base.slope - -1.175).abs() < 1e-9);
    }

    #[test]
    fn test_concrete_left_lane_projection() {
        let detection = aggregator().aggregate(&[Segment::new(300, 700, 400, 500)], 720);

        assert_eq!(
            detection.left.line(),
            Some(LaneLine {
                x1: 290,
                y1: 720,
                x2: 434,
                y2: 432,
            })
        );
        assert_eq!(detection.right, LaneStatus::Undetermined);
    }

    #[test]
    fn test_round_trip_matches_line_equation() {
        // y = 0.5x + 100, right side
        let segment = Segment::new(600, 400, 1000, 600);
        let detection = aggregator().aggregate(&[segment], 720);
        let line = detection.right.line().unwrap();

        let expected_x = |y: f64| (y - 100.0) / 0.5;
        assert_eq!(line.y1, 720);
        assert_eq!(line.y2, 432);
        assert!((line.x1 as f64 - expected_x(720.0)).abs() < 1.0);
        assert!((line.x2 as f64 - expected_x(432.0)).abs() < 1.0);
    }

    #[test]
    fn test_coordinates_truncate_toward_zero() {
        // x1 = (720 - 0) / 3 = 240, x2 = 432 / 3 = 144
        let exact = LineParameters { slope: 3.0, intercept: 0.0 };
        let line = make_coordinates(LaneSide::Right, &exact, 720, 0.6).unwrap();
        assert_eq!((line.x1, line.x2), (240, 144));

        // x1 = 720 / 7 = 102.86 -> 102
        let fractional = LineParameters { slope: 7.0, intercept: 0.0 };
        let line = make_coordinates(LaneSide::Right, &fractional, 720, 0.6).unwrap();
        assert_eq!(line.x1, 102);

        // x1 = (720 - 1000) / 3 = -93.3 -> -93
        let negative = LineParameters { slope: 3.0, intercept: 1000.0 };
        let line = make_coordinates(LaneSide::Right, &negative, 720, 0.6).unwrap();
        assert_eq!(line.x1, -93);
    }

    #[test]
    fn test_zero_slope_is_degenerate() {
        let flat = LineParameters { slope: 0.0, intercept: 400.0 };
        let err = make_coordinates(LaneSide::Right, &flat, 720, 0.6).unwrap_err();
        assert_eq!(
            err,
            LaneError::DegenerateGeometry {
                side: LaneSide::Right,
                slope: 0.0
            }
        );

        let detection = aggregator().aggregate(&[Segment::new(100, 400, 300, 400)], 720);
        assert_eq!(detection.right, LaneStatus::Degenerate { slope: 0.0 });
        assert_eq!(detection.left, LaneStatus::Undetermined);
        assert!(detection.lines().is_empty());
    }

    #[test]
    fn test_unrepresentable_projection_is_degenerate() {
        let nearly_flat = LineParameters { slope: 1e-12, intercept: 0.0 };
        assert!(make_coordinates(LaneSide::Right, &nearly_flat, 720, 0.6).is_err());
    }

    #[test]
    fn test_no_segments_leaves_both_sides_undetermined() {
        let detection = aggregator().aggregate(&[], 720);
        assert_eq!(detection, LaneDetection::undetermined());
        assert!(detection.lines().is_empty());
    }

    #[test]
    fn test_both_sides_detected_with_support_counts() {
        let segments = [
            Segment::new(300, 700, 400, 500),
            Segment::new(320, 690, 420, 490),
            Segment::new(800, 500, 900, 700),
        ];
        let detection = aggregator().aggregate(&segments, 720);

        match detection.left {
            LaneStatus::Detected { support, params, .. } => {
                assert_eq!(support, 2);
                assert!((params.slope - -2.0).abs() < 1e-9);
            }
            other => panic!("expected left lane, got {:?}", other),
        }
        match detection.right {
            LaneStatus::Detected { support, .. } => assert_eq!(support, 1),
            other => panic!("expected right lane, got {:?}", other),
        }
        assert_eq!(detection.lines().len(), 2);
    }
}
