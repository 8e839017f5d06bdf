use crate::core_modules::axis_estimator::DEFAULT_SQUARE_TOLERANCE;
use crate::core_modules::color_mask::{ColorRange, MorphologyConfig};
use crate::core_modules::error::TrackingError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Number of points tracked along the neutral axis.
pub const DEFAULT_NUM_POINTS: usize = 10;
/// Minimum contour area, in pixels, for a region to count as the actuator.
pub const DEFAULT_MIN_CONTOUR_AREA: f64 = 500.0;

/// Configuration for the DeflectionPipeline. Supplied once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub color_range: ColorRange,
    pub min_contour_area: f64,
    pub num_points: usize,
    pub morphology: MorphologyConfig,
    /// Relative side difference under which a fitted rectangle is flagged near-square.
    pub square_aspect_tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            color_range: ColorRange::default(),
            min_contour_area: DEFAULT_MIN_CONTOUR_AREA,
            num_points: DEFAULT_NUM_POINTS,
            morphology: MorphologyConfig::default(),
            square_aspect_tolerance: DEFAULT_SQUARE_TOLERANCE,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config {}", path.display()))?;
        let config = Self::from_json(&contents)
            .with_context(|| format!("parsing pipeline config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TrackingError> {
        self.color_range.validate()?;
        if !(self.min_contour_area.is_finite() && self.min_contour_area > 0.0) {
            return Err(TrackingError::InputValidation(format!(
                "min_contour_area must be positive, got {}",
                self.min_contour_area
            )));
        }
        if self.num_points == 0 {
            return Err(TrackingError::InputValidation(
                "num_points must be at least 1".into(),
            ));
        }
        if !(self.square_aspect_tolerance.is_finite() && self.square_aspect_tolerance >= 0.0) {
            return Err(TrackingError::InputValidation(format!(
                "square_aspect_tolerance must be non-negative, got {}",
                self.square_aspect_tolerance
            )));
        }
        Ok(())
    }
}
