// THEORY:
// The `pipeline` module is the top-level API of the tracking engine. It chains
// the per-frame stages (mask -> contour -> axis -> samples) and the one stateful
// stage (deflection against a captured reference) behind a single interface.
//
// Key architectural principles:
// 1.  **Explicit results**: A frame either yields `FrameReport::Detected` or
//     `FrameReport::NotFound`. Neither is an error; errors are reserved for bad
//     input and broken invariants.
// 2.  **Commands, not flags**: The user command channel is modelled as `Command`
//     values applied between frames. Capturing uses the detection from the most
//     recently processed frame and is rejected when that frame had none.
// 3.  **Single-threaded**: One frame is processed completely before the next. The
//     only mutable state is the tracker's reference and the last detection.

use crate::config::PipelineConfig;
use crate::core_modules::axis_estimator::AxisEstimator;
use crate::core_modules::axis_sampler::axis_sampler;
use crate::core_modules::color_mask::ColorMaskFilter;
use crate::core_modules::contour_extractor::contour_extractor;
use crate::core_modules::deflection_tracker::DeflectionTracker;
use image::{GrayImage, RgbImage};
use serde::Serialize;

// Re-export key data structures for the public API.
pub use crate::core_modules::axis_estimator::{AxisFit, AxisSegment};
pub use crate::core_modules::axis_sampler::SampleSet;
pub use crate::core_modules::deflection_tracker::{DeflectionResult, ReferenceState};
pub use crate::core_modules::error::TrackingError;
pub use crate::core_modules::oriented_rect::OrientedRect;
pub use crate::core_modules::region::Region;

/// Everything the pipeline learned about the actuator in one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub region: Region,
    pub rect: OrientedRect,
    pub axis: AxisSegment,
    pub samples: SampleSet,
    /// The fitted rectangle was close to square; the axis direction may be unreliable.
    pub near_square: bool,
    /// Present only while a reference pose is held.
    pub deflection: Option<DeflectionResult>,
    /// The reference axis, for drawing alongside the current one.
    pub reference_axis: Option<AxisSegment>,
}

/// The primary output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrameReport {
    NotFound {
        /// Area of the biggest region seen, if any.
        largest_area: Option<f64>,
    },
    Detected(Detection),
}

impl FrameReport {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            FrameReport::Detected(detection) => Some(detection),
            FrameReport::NotFound { .. } => None,
        }
    }
}

/// Commands arriving from the user between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CaptureReference,
    ResetReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    ReferenceCaptured { points: usize },
    /// The last processed frame had no detection; the reference is unchanged.
    CaptureRejected,
    ReferenceCleared,
}

/// The main, top-level struct for the tracking engine.
pub struct DeflectionPipeline {
    config: PipelineConfig,
    mask_filter: ColorMaskFilter,
    axis_estimator: AxisEstimator,
    tracker: DeflectionTracker,
    last_detection: Option<Detection>,
    last_mask: Option<GrayImage>,
}

impl DeflectionPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, TrackingError> {
        config.validate()?;
        let mask_filter = ColorMaskFilter::new(config.color_range, config.morphology)?;
        let axis_estimator = AxisEstimator::new(config.square_aspect_tolerance);
        Ok(Self {
            config,
            mask_filter,
            axis_estimator,
            tracker: DeflectionTracker::new(),
            last_detection: None,
            last_mask: None,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn process_frame(&mut self, frame: &RgbImage) -> Result<FrameReport, TrackingError> {
        // A frame that fails must not leave the previous one's results behind.
        self.last_detection = None;
        self.last_mask = None;

        // Stage 1: Color Mask
        let mask = self.mask_filter.apply(frame)?;

        // Stages 2-4: Contour, Axis, Samples
        let report = self.process_mask(&mask);
        self.last_mask = Some(mask);
        report
    }

    /// Runs the pipeline from an already thresholded mask onwards.
    pub fn process_mask(&mut self, mask: &GrayImage) -> Result<FrameReport, TrackingError> {
        self.last_detection = None;

        // Stage 2: Dominant Region
        let region = match contour_extractor::extract_dominant(mask, self.config.min_contour_area) {
            Ok(region) => region,
            Err(TrackingError::NotFound { largest_area, .. }) => {
                tracing::debug!(?largest_area, "actuator not found");
                return Ok(FrameReport::NotFound { largest_area });
            }
            Err(e) => return Err(e),
        };

        // Stage 3: Neutral Axis
        let fit = self.axis_estimator.fit(&region)?;

        // Stage 4: Sampling
        let samples = axis_sampler::sample(&fit.axis, self.config.num_points)?;

        // Stage 5: Deflection (only with a reference)
        let deflection = match self.tracker.compute(&samples) {
            Ok(result) => Some(result),
            Err(TrackingError::NoReference) => None,
            Err(e) => return Err(e),
        };

        tracing::debug!(
            area = region.area,
            start = ?fit.axis.start,
            end = ?fit.axis.end,
            mean_deflection = deflection.as_ref().map(|d| d.mean),
            "actuator detected"
        );

        let detection = Detection {
            region,
            rect: fit.rect,
            axis: fit.axis,
            samples,
            near_square: fit.near_square,
            deflection,
            reference_axis: self.tracker.reference().map(|r| r.axis),
        };
        self.last_detection = Some(detection.clone());
        Ok(FrameReport::Detected(detection))
    }

    pub fn apply(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::CaptureReference => self.capture_reference(),
            Command::ResetReference => self.reset_reference(),
        }
    }

    /// Captures the last processed frame's axis and samples as the reference.
    pub fn capture_reference(&mut self) -> CommandOutcome {
        let Some(detection) = self.last_detection.as_ref() else {
            tracing::warn!("cannot set reference: actuator not found in current frame");
            return CommandOutcome::CaptureRejected;
        };
        let points = detection.samples.len();
        match self
            .tracker
            .capture(detection.axis, detection.samples.clone())
        {
            Ok(()) => CommandOutcome::ReferenceCaptured { points },
            Err(e) => {
                tracing::warn!("cannot set reference: {}", e);
                CommandOutcome::CaptureRejected
            }
        }
    }

    pub fn reset_reference(&mut self) -> CommandOutcome {
        self.tracker.reset();
        CommandOutcome::ReferenceCleared
    }

    pub fn reference(&self) -> Option<&ReferenceState> {
        self.tracker.reference()
    }

    pub fn last_detection(&self) -> Option<&Detection> {
        self.last_detection.as_ref()
    }

    /// The binary mask of the last frame passed to `process_frame`.
    pub fn last_mask(&self) -> Option<&GrayImage> {
        self.last_mask.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_mask::{MASK_SET, MorphologyConfig};
    use crate::core_modules::region::Point;
    use approx::assert_relative_eq;
    use image::{Luma, Rgb};

    fn bar_mask(center_x: u32, center_y: u32) -> GrayImage {
        let mut mask = GrayImage::new(200, 200);
        for y in center_y - 50..center_y + 50 {
            for x in center_x - 10..center_x + 10 {
                mask.put_pixel(x, y, Luma([MASK_SET]));
            }
        }
        mask
    }

    fn config(num_points: usize) -> PipelineConfig {
        PipelineConfig {
            num_points,
            morphology: MorphologyConfig::disabled(),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn bar_axis_and_samples() {
        let mut pipeline = DeflectionPipeline::new(config(5)).unwrap();
        let report = pipeline.process_mask(&bar_mask(50, 50)).unwrap();
        let detection = report.detection().unwrap();

        assert_eq!(detection.axis.start, Point::new(50, 0));
        assert_eq!(detection.axis.end, Point::new(50, 99));
        let ys: Vec<i32> = detection.samples.iter().map(|p| p.y).collect();
        for (y, expected) in ys.iter().zip([0, 25, 50, 75, 100]) {
            assert!((y - expected).abs() <= 1, "{} vs {}", y, expected);
        }
        assert!(detection.samples.iter().all(|p| p.x == 50));
        assert!(detection.deflection.is_none());
    }

    #[test]
    fn shifted_bar_deflects_by_diagonal() {
        let mut pipeline = DeflectionPipeline::new(config(5)).unwrap();
        pipeline.process_mask(&bar_mask(50, 50)).unwrap();
        assert_eq!(
            pipeline.apply(Command::CaptureReference),
            CommandOutcome::ReferenceCaptured { points: 5 }
        );

        let report = pipeline.process_mask(&bar_mask(60, 60)).unwrap();
        let deflection = report.detection().unwrap().deflection.clone().unwrap();
        assert_eq!(deflection.displacements.len(), 5);
        for d in &deflection.displacements {
            assert_relative_eq!(*d, 14.142135623730951, epsilon = 1e-6);
        }
        assert_relative_eq!(deflection.mean, 14.142135623730951, epsilon = 1e-6);
    }

    #[test]
    fn capture_rejected_without_detection() {
        let mut pipeline = DeflectionPipeline::new(config(10)).unwrap();
        assert_eq!(
            pipeline.apply(Command::CaptureReference),
            CommandOutcome::CaptureRejected
        );

        let report = pipeline.process_mask(&GrayImage::new(64, 64)).unwrap();
        assert_eq!(report, FrameReport::NotFound { largest_area: None });
        assert_eq!(
            pipeline.apply(Command::CaptureReference),
            CommandOutcome::CaptureRejected
        );
        assert!(pipeline.reference().is_none());
    }

    #[test]
    fn reference_survives_lost_frames_until_reset() {
        let mut pipeline = DeflectionPipeline::new(config(10)).unwrap();
        pipeline.process_mask(&bar_mask(100, 100)).unwrap();
        pipeline.apply(Command::CaptureReference);

        pipeline.process_mask(&GrayImage::new(200, 200)).unwrap();
        assert!(pipeline.reference().is_some());

        let report = pipeline.process_mask(&bar_mask(100, 100)).unwrap();
        let detection = report.detection().unwrap();
        assert_eq!(detection.deflection.as_ref().unwrap().mean, 0.0);
        assert_eq!(detection.reference_axis, Some(detection.axis));

        assert_eq!(
            pipeline.apply(Command::ResetReference),
            CommandOutcome::ReferenceCleared
        );
        let report = pipeline.process_mask(&bar_mask(100, 100)).unwrap();
        assert!(report.detection().unwrap().deflection.is_none());
    }

    #[test]
    fn process_frame_keeps_mask() {
        let mut frame = RgbImage::from_pixel(120, 120, Rgb([10, 10, 10]));
        for y in 10..110 {
            for x in 50..70 {
                frame.put_pixel(x, y, Rgb([30, 200, 40]));
            }
        }
        let mut pipeline = DeflectionPipeline::new(PipelineConfig::default()).unwrap();
        let report = pipeline.process_frame(&frame).unwrap();

        assert!(report.detection().is_some());
        assert_eq!(pipeline.last_mask().unwrap().dimensions(), (120, 120));
    }

    #[test]
    fn failed_frame_drops_previous_detection() {
        let mut frame = RgbImage::from_pixel(120, 120, Rgb([10, 10, 10]));
        for y in 10..110 {
            for x in 50..70 {
                frame.put_pixel(x, y, Rgb([30, 200, 40]));
            }
        }
        let mut pipeline = DeflectionPipeline::new(PipelineConfig::default()).unwrap();
        assert!(pipeline.process_frame(&frame).unwrap().detection().is_some());

        let err = pipeline.process_frame(&RgbImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, TrackingError::InputValidation(_)));
        assert!(pipeline.last_detection().is_none());
        assert!(pipeline.last_mask().is_none());
        assert_eq!(
            pipeline.apply(Command::CaptureReference),
            CommandOutcome::CaptureRejected
        );
        assert!(pipeline.reference().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(DeflectionPipeline::new(config(0)).is_err());
    }
}
