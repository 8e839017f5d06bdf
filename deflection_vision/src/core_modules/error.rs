// THEORY:
// Every stage of the tracking pipeline reports failure through one enum. Two of
// the variants (`NotFound`, `NoReference`) are not failures at all in the usual
// sense: they are the normal state of a frame where the actuator is out of view,
// or of a session where no reference pose has been captured yet. The pipeline
// folds those into plain report values. The remaining variants are contract
// violations and are propagated to the caller unchanged.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TrackingError {
    /// No region in the mask reached the minimum area.
    NotFound {
        /// Area of the biggest region seen, if the mask had any region at all.
        largest_area: Option<f64>,
        min_area: f64,
    },
    /// A region too small to describe a shape (fewer than 3 boundary points).
    InvalidRegion { points: usize },
    /// Deflection was requested before a reference pose was captured.
    NoReference,
    /// The current sample set does not line up with the reference sample set.
    SampleCountMismatch { expected: usize, got: usize },
    /// Malformed arguments: image dimensions, sample counts, color bounds.
    InputValidation(String),
}

impl TrackingError {
    /// True for the conditions that occur in normal operation and only mean
    /// "nothing to show this frame".
    pub fn is_steady_state(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoReference)
    }
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound {
                largest_area: Some(area),
                min_area,
            } => write!(
                f,
                "actuator not found: largest region area {:.1} is below {:.1}",
                area, min_area
            ),
            Self::NotFound {
                largest_area: None, ..
            } => write!(f, "actuator not found: mask has no regions"),
            Self::InvalidRegion { points } => {
                write!(f, "invalid region: need at least 3 points, got {}", points)
            }
            Self::NoReference => write!(f, "no reference pose captured"),
            Self::SampleCountMismatch { expected, got } => write!(
                f,
                "sample count mismatch: reference has {}, current has {}",
                expected, got
            ),
            Self::InputValidation(msg) => write!(f, "invalid input: {}", msg),
        }
    }
}

impl std::error::Error for TrackingError {}
