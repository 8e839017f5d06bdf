// THEORY:
// The `ContourExtractor` is the spatial grouping layer. It takes the binary mask
// from the `ColorMaskFilter` and finds the single patch of pixels that is most
// likely the actuator.
//
// Algorithm steps:
// 1.  **Border Following**: `imageproc` traces every border of the mask
//     (8-connected foreground) and records which border encloses which.
//     Its scan never starts an outer border in column 0, so the mask is traced
//     inside a one pixel clear frame and the points are shifted back.
// 2.  **External Only**: Only outer borders without a parent are kept. Holes, and
//     components sitting inside a hole of another component, are dropped.
// 3.  **Compression**: Runs of identical steps collapse to their end points, so a
//     clean rectangle is described by its four corners.
// 4.  **Selection**: The region with the greatest enclosed area wins. Borders come
//     out in raster order of their top-left pixel and ties keep the first one,
//     so two equal patches never flicker.
// 5.  **Stateless Utility**: Nothing is remembered between frames.

use crate::core_modules::error::TrackingError;
use crate::core_modules::region::{Point, Region};
use image::GrayImage;

pub mod contour_extractor {
    use super::*;
    use image::imageops;
    use imageproc::contours::{BorderType, find_contours};

    /// Picks the dominant region of the mask.
    ///
    /// Signals `NotFound` when the mask has no region or when the largest region's
    /// area is strictly below `min_area`.
    pub fn extract_dominant(mask: &GrayImage, min_area: f64) -> Result<Region, TrackingError> {
        if !(min_area.is_finite() && min_area > 0.0) {
            return Err(TrackingError::InputValidation(format!(
                "minimum contour area must be positive, got {}",
                min_area
            )));
        }

        let regions = find_regions(mask);
        let mut dominant: Option<Region> = None;
        for region in regions {
            let is_larger = dominant
                .as_ref()
                .map_or(true, |best| region.area > best.area);
            if is_larger {
                dominant = Some(region);
            }
        }

        match dominant {
            Some(region) if region.area >= min_area => {
                tracing::trace!(
                    area = region.area,
                    points = region.len(),
                    "dominant region selected"
                );
                Ok(region)
            }
            Some(region) => Err(TrackingError::NotFound {
                largest_area: Some(region.area),
                min_area,
            }),
            None => Err(TrackingError::NotFound {
                largest_area: None,
                min_area,
            }),
        }
    }

    /// Every external region of the mask, in raster order of their top-left pixel.
    /// Any non-zero mask pixel counts as set.
    pub fn find_regions(mask: &GrayImage) -> Vec<Region> {
        let (width, height) = mask.dimensions();
        let mut framed = GrayImage::new(width + 2, height + 2);
        imageops::replace(&mut framed, mask, 1, 1);

        let regions: Vec<Region> = find_contours::<i32>(&framed)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
            .map(|contour| {
                let points = contour
                    .points
                    .iter()
                    .map(|p| Point::new(p.x - 1, p.y - 1))
                    .collect();
                Region::new(compress(points))
            })
            .collect();

        tracing::trace!("{} regions found", regions.len());
        regions
    }

    /// Drops points lying in the middle of a straight run of identical steps.
    fn compress(points: Vec<Point>) -> Vec<Point> {
        let n = points.len();
        if n < 3 {
            return points;
        }
        let mut kept = vec![points[0]];
        for i in 1..n {
            let prev = points[i - 1];
            let cur = points[i];
            let next = points[(i + 1) % n];
            let step_in = (cur.x - prev.x, cur.y - prev.y);
            let step_out = (next.x - cur.x, next.y - cur.y);
            if step_in != step_out {
                kept.push(cur);
            }
        }
        kept
    }
}
