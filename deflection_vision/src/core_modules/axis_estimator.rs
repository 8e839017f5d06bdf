// THEORY:
// The `AxisEstimator` derives the neutral axis of the actuator: the centreline
// running through the middle of the shape along its long dimension.
//
// Key architectural principles:
// 1.  **Rectangle model**: The actuator is modelled by the minimum-area oriented
//     rectangle of its boundary, normalized so that `height` is the long side.
// 2.  **Corner geometry decides**: Minimum-area fitting cannot tell a rectangle
//     rotated by θ from the same rectangle rotated by θ ± 90° with its sides
//     swapped. The reported angle is therefore not trusted. Instead the two side
//     lengths are compared on the corners themselves and the midpoints of the two
//     shorter sides become the axis endpoints.
// 3.  **Stable ordering**: The endpoint with the smaller vertical coordinate is
//     always first (ties broken on the horizontal coordinate). Sample `i` of one
//     frame is then comparable with sample `i` of the next.
// 4.  **Near-square warning**: When both sides are almost equal, "shorter side" is
//     decided by noise and the axis may jump by 90° between frames. The fit is
//     still produced but flagged, so the caller can decide what to trust.

use crate::core_modules::error::TrackingError;
use crate::core_modules::oriented_rect::{OrientedRect, Point2f};
use crate::core_modules::region::{Point, Region};
use serde::Serialize;

/// Relative side-length difference under which a rectangle counts as near-square.
pub const DEFAULT_SQUARE_TOLERANCE: f64 = 0.05;

/// The long-axis centreline of a tracked shape. `start.y <= end.y` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisSegment {
    pub start: Point,
    pub end: Point,
}

impl AxisSegment {
    /// Orders the two endpoints: smaller y first, then smaller x.
    pub fn ordered(a: Point, b: Point) -> Self {
        if (b.y, b.x) < (a.y, a.x) {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// The point at fraction `t` from `start` towards `end`.
    pub fn lerp(&self, t: f64) -> Point2f {
        let start = Point2f::from(self.start);
        let end = Point2f::from(self.end);
        Point2f::new(
            start.x + t * (end.x - start.x),
            start.y + t * (end.y - start.y),
        )
    }

    pub fn midpoint(&self) -> Point2f {
        self.lerp(0.5)
    }
}

/// Result of fitting an axis to a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisFit {
    /// The normalized (`height >= width`) minimum-area rectangle.
    pub rect: OrientedRect,
    pub axis: AxisSegment,
    /// Set when the rectangle's sides differ by less than the square tolerance.
    pub near_square: bool,
}

/// Fits minimum-area rectangles to regions and extracts their neutral axes.
#[derive(Debug, Clone, Copy)]
pub struct AxisEstimator {
    square_tolerance: f64,
}

impl Default for AxisEstimator {
    fn default() -> Self {
        Self {
            square_tolerance: DEFAULT_SQUARE_TOLERANCE,
        }
    }
}

impl AxisEstimator {
    pub fn new(square_tolerance: f64) -> Self {
        Self {
            square_tolerance: square_tolerance.max(0.0),
        }
    }

    pub fn estimate(&self, region: &Region) -> Result<AxisSegment, TrackingError> {
        self.fit(region).map(|fit| fit.axis)
    }

    pub fn fit(&self, region: &Region) -> Result<AxisFit, TrackingError> {
        if region.len() < 3 {
            return Err(TrackingError::InvalidRegion {
                points: region.len(),
            });
        }

        let rect = OrientedRect::min_area(&region.points).normalized();
        let [c0, c1, c2, c3] = rect.corners();

        let side_a = c0.distance(&c1);
        let side_b = c1.distance(&c2);
        let (first, second) = if side_a < side_b {
            (c0.midpoint(&c1), c2.midpoint(&c3))
        } else {
            (c1.midpoint(&c2), c3.midpoint(&c0))
        };

        let long = side_a.max(side_b);
        let short = side_a.min(side_b);
        let near_square = long == 0.0 || (long - short) / long < self.square_tolerance;
        if near_square {
            tracing::warn!(
                width = rect.width,
                height = rect.height,
                "near-square rectangle, axis direction is ambiguous"
            );
        }

        Ok(AxisFit {
            rect,
            axis: AxisSegment::ordered(first.round(), second.round()),
            near_square,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    fn region(points: &[(i32, i32)]) -> Region {
        Region::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn ordering_is_symmetric() {
        let a = Point::new(12, 80);
        let b = Point::new(30, 4);
        assert_eq!(AxisSegment::ordered(a, b), AxisSegment::ordered(b, a));
        assert_eq!(AxisSegment::ordered(a, b).start, b);

        // equal heights fall back to x
        let left = Point::new(3, 10);
        let right = Point::new(9, 10);
        assert_eq!(AxisSegment::ordered(right, left).start, left);
        assert_eq!(AxisSegment::ordered(left, right).start, left);
    }

    #[test]
    fn vertical_bar_axis_runs_top_to_bottom() {
        // boundary of a 20x100 pixel bar centred on (50, 50)
        let bar = region(&[(40, 0), (59, 0), (59, 99), (40, 99)]);
        let fit = AxisEstimator::default().fit(&bar).unwrap();

        assert_eq!(fit.axis.start, Point::new(50, 0));
        assert_eq!(fit.axis.end, Point::new(50, 99));
        assert!(fit.rect.height >= fit.rect.width);
        assert!(!fit.near_square);
    }

    #[test]
    fn horizontal_bar_axis_still_uses_short_sides() {
        let bar = region(&[(0, 20), (99, 20), (99, 29), (0, 29)]);
        let axis = AxisEstimator::default().estimate(&bar).unwrap();

        // tie on y (24.5 rounds to 25 on both ends), so the left end comes first
        assert_eq!(axis.start, Point::new(0, 25));
        assert_eq!(axis.end, Point::new(99, 25));
    }

    #[test]
    fn reflected_and_rotated_inputs_give_same_axis() {
        let points = [(10, 0), (30, 20), (20, 30), (0, 10)];
        let forward = region(&points);
        let mut reversed_points = points.to_vec();
        reversed_points.reverse();
        let reversed = region(&reversed_points);
        let mut rotated_points = points.to_vec();
        rotated_points.rotate_left(2);
        let rotated = region(&rotated_points);

        let estimator = AxisEstimator::default();
        let axis = estimator.estimate(&forward).unwrap();
        assert_eq!(estimator.estimate(&reversed).unwrap(), axis);
        assert_eq!(estimator.estimate(&rotated).unwrap(), axis);

        // long sides run from (10,0)-(30,20) and (0,10)-(20,30); the fitted
        // corners snap to the pixel grid, so the ends may move by a pixel
        assert!(axis.start.distance(&Point::new(5, 5)) <= 1.5, "{:?}", axis);
        assert!(axis.end.distance(&Point::new(25, 25)) <= 1.5, "{:?}", axis);
    }

    #[test]
    fn too_few_points_is_invalid() {
        let line = region(&[(0, 0), (10, 0)]);
        assert_eq!(
            AxisEstimator::default().fit(&line).unwrap_err(),
            TrackingError::InvalidRegion { points: 2 }
        );
    }

    #[test]
    fn square_is_flagged() {
        let square = region(&[(0, 0), (40, 0), (40, 40), (0, 40)]);
        let first = AxisEstimator::default().fit(&square).unwrap();
        let second = AxisEstimator::default().fit(&square).unwrap();
        assert!(first.near_square);
        assert_eq!(first.axis, second.axis);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn near_square_fit_is_logged_as_warning() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();

        let square = region(&[(0, 0), (40, 0), (40, 40), (0, 40)]);
        let bar = region(&[(40, 0), (59, 0), (59, 99), (40, 99)]);
        tracing::subscriber::with_default(subscriber, || {
            AxisEstimator::default().fit(&bar).unwrap();
            assert!(logs.0.lock().unwrap().is_empty());
            AxisEstimator::default().fit(&square).unwrap();
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{}", output);
        assert!(output.contains("near-square"), "{}", output);
    }

    #[test]
    fn lerp_hits_endpoints() {
        let axis = AxisSegment::ordered(Point::new(2, 3), Point::new(12, 43));
        assert_eq!(axis.lerp(0.0).round(), axis.start);
        assert_eq!(axis.lerp(1.0).round(), axis.end);
        assert_eq!(axis.midpoint(), Point2f::new(7.0, 23.0));
    }
}
