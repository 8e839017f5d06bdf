// THEORY:
// The `AxisSampler` turns the continuous axis segment into a fixed number of
// discrete measurement points. Deflection is measured per point, so the sampling
// must be reproducible: point `i` always sits at fraction `i / (N - 1)` along the
// segment, measured from `start`. Together with the endpoint ordering of
// `AxisSegment`, this makes index `i` in one frame correspond to index `i` in any
// other frame.
//
// The sampler is a stateless utility.

use crate::core_modules::axis_estimator::AxisSegment;
use crate::core_modules::error::TrackingError;
use crate::core_modules::region::Point;
use serde::Serialize;

/// Evenly spaced points along an axis, ordered from `start` to `end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SampleSet {
    pub points: Vec<Point>,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }
}

impl From<Vec<Point>> for SampleSet {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

pub mod axis_sampler {
    use super::*;

    /// Interpolates `count` points along `axis`.
    ///
    /// With `count == 1` the single point is the segment midpoint. Otherwise the
    /// first and last points are exactly `axis.start` and `axis.end`.
    pub fn sample(axis: &AxisSegment, count: usize) -> Result<SampleSet, TrackingError> {
        match count {
            0 => Err(TrackingError::InputValidation(
                "sample count must be at least 1".into(),
            )),
            1 => Ok(SampleSet::from(vec![axis.midpoint().round()])),
            _ => {
                let last = count - 1;
                let points: Vec<Point> = (0..count)
                    .map(|i| match i {
                        0 => axis.start,
                        i if i == last => axis.end,
                        i => axis.lerp(i as f64 / last as f64).round(),
                    })
                    .collect();
                Ok(SampleSet::from(points))
            }
        }
    }
}
