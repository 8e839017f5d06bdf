// THEORY:
// The `OrientedRect` is the geometric summary of a region: the smallest-area
// rectangle, at any rotation, that contains every boundary point.
//
// Algorithm steps:
// 1.  **Convex Hull**: The minimum rectangle of a point set equals the minimum
//     rectangle of its convex hull. Interior points and duplicates are dropped
//     before `imageproc` fits the rectangle.
// 2.  **Rotating Calipers**: `imageproc::geometry::min_area_rect` tries every hull
//     edge as a side direction and returns the four corners of the best fit on
//     the pixel grid.
// 3.  **Orientation**: `width` is the length of the first side (corner 0 to 1),
//     `height` the length of the next one, and `angle` is the direction of the
//     first side in degrees. Fitting gives no guarantee about which side is the
//     long one; `normalized` swaps the sides so that `height` is the long side.

use crate::core_modules::region::Point;
use imageproc::geometry::{convex_hull, min_area_rect};
use imageproc::point::Point as PixelPoint;
use serde::Serialize;

const SNAP_SCALE: f64 = 1e6;

/// A 2D floating-point point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point2f {
    pub x: f64,
    pub y: f64,
}

impl Point2f {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2f) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Point2f) -> Point2f {
        Point2f::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Nearest integer pixel, halves rounded away from zero.
    pub fn round(&self) -> Point {
        // Snap first: corners come out of sin/cos, and 24.5 - 3e-15 must still round to 25.
        let snap = |v: f64| ((v * SNAP_SCALE).round() / SNAP_SCALE).round() as i32;
        Point::new(snap(self.x), snap(self.y))
    }
}

impl From<Point> for Point2f {
    fn from(p: Point) -> Self {
        Point2f::new(p.x as f64, p.y as f64)
    }
}

impl From<PixelPoint<i32>> for Point2f {
    fn from(p: PixelPoint<i32>) -> Self {
        Point2f::new(p.x as f64, p.y as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrientedRect {
    pub center: Point2f,
    /// Length of the side from corner 0 to corner 1.
    pub width: f64,
    /// Length of the side from corner 1 to corner 2.
    pub height: f64,
    /// Direction of the `width` side in degrees.
    pub angle: f64,
}

impl OrientedRect {
    /// Smallest-area rectangle enclosing `points`. An empty slice gives a
    /// zero-sized rectangle at the origin.
    pub fn min_area(points: &[Point]) -> Self {
        let mut pixels: Vec<PixelPoint<i32>> = points.iter().map(|&p| p.into()).collect();
        // The hull's angular sort is only a total order on distinct points.
        pixels.sort_by_key(|p| (p.x, p.y));
        pixels.dedup();

        let hull = convex_hull(pixels);
        if hull.is_empty() {
            return Self {
                center: Point2f::default(),
                width: 0.0,
                height: 0.0,
                angle: 0.0,
            };
        }
        Self::from_corners(min_area_rect(&hull).map(Point2f::from))
    }

    /// Rebuilds the rectangle from its corners, listed in order around it.
    pub fn from_corners(corners: [Point2f; 4]) -> Self {
        let [c0, c1, c2, c3] = corners;
        let center = Point2f::new(
            (c0.x + c1.x + c2.x + c3.x) / 4.0,
            (c0.y + c1.y + c2.y + c3.y) / 4.0,
        );
        let width = c0.distance(&c1);
        let angle = if width > 0.0 {
            (c1.y - c0.y).atan2(c1.x - c0.x).to_degrees()
        } else {
            0.0
        };
        Self {
            center,
            width,
            height: c1.distance(&c2),
            angle,
        }
    }

    /// The same rectangle described with `height >= width`, angle in (-90, 90].
    pub fn normalized(&self) -> Self {
        let mut rect = *self;
        if rect.width > rect.height {
            std::mem::swap(&mut rect.width, &mut rect.height);
            rect.angle += 90.0;
        }
        while rect.angle > 90.0 {
            rect.angle -= 180.0;
        }
        while rect.angle <= -90.0 {
            rect.angle += 180.0;
        }
        rect
    }

    /// The four corners in order, so that sides 0-1 and 2-3 have length `width`
    /// and sides 1-2 and 3-0 have length `height`.
    pub fn corners(&self) -> [Point2f; 4] {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        let c = self.center;
        let corner = |su: f64, sv: f64| {
            Point2f::new(
                c.x + su * hw * cos - sv * hh * sin,
                c.y + su * hw * sin + sv * hh * cos,
            )
        };
        [
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        ]
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Long side over short side; infinite for a degenerate (zero-width) rectangle.
    pub fn aspect_ratio(&self) -> f64 {
        let long = self.width.max(self.height);
        let short = self.width.min(self.height);
        if short == 0.0 {
            f64::INFINITY
        } else {
            long / short
        }
    }
}
