// THEORY:
// A `Region` is the output of the contour layer: the outer boundary of one
// connected patch of set mask pixels, in pixel coordinates.
//
// Key architectural principles:
// 1.  **Boundary, not fill**: Only the outer boundary is kept. Holes inside the
//     actuator (glare, markings) do not change its silhouette and are not tracked.
// 2.  **Stateless Data Container**: Like `OrientedRect` and `AxisSegment`, a
//     `Region` is a snapshot of a single frame. It is discarded once the frame has
//     been processed.
// 3.  **Area on the polygon**: The area is the polygon area enclosed by the
//     boundary through pixel centres, so a straight one-pixel line has none.

use imageproc::geometry::contour_area;
use imageproc::point::Point as PixelPoint;
use serde::Serialize;

/// A 2D integer point in pixel coordinates (x to the right, y downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }
}

impl From<PixelPoint<i32>> for Point {
    fn from(p: PixelPoint<i32>) -> Self {
        Point::new(p.x, p.y)
    }
}

impl From<Point> for PixelPoint<i32> {
    fn from(p: Point) -> Self {
        PixelPoint::new(p.x, p.y)
    }
}

/// The outer boundary of one connected component of a binary mask.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    /// Boundary points in tracing order, collinear runs compressed to their ends.
    pub points: Vec<Point>,
    /// Polygon area enclosed by `points`.
    pub area: f64,
}

impl Region {
    pub fn new(points: Vec<Point>) -> Self {
        let pixels: Vec<PixelPoint<i32>> = points.iter().map(|&p| p.into()).collect();
        let area = contour_area(&pixels);
        Self { points, area }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
