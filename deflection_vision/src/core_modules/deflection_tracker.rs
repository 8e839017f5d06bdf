// THEORY:
// The `deflection_tracker` module adds memory to the otherwise stateless
// pipeline. Every other stage looks at one frame in isolation; the
// `DeflectionTracker` compares the current frame with a reference pose that was
// captured earlier.
//
// Key architectural principles:
// 1.  **Owned Reference**: The reference (axis + sample points) is an explicit,
//     optional field of the tracker. There is no process-wide state.
// 2.  **Lifecycle**: Absent at startup. `capture` stores the current pose,
//     overwriting any previous one. `reset` clears it. Frames where the actuator
//     is not detected leave it untouched.
// 3.  **Per-index comparison**: Deflection is the Euclidean distance between
//     sample `i` now and sample `i` in the reference. The sampler's ordering
//     guarantees these indices refer to the same place on the actuator.
// 4.  **Fresh results**: A `DeflectionResult` is computed on demand and never
//     stored, so it can never go stale.

use crate::core_modules::axis_estimator::AxisSegment;
use crate::core_modules::axis_sampler::SampleSet;
use crate::core_modules::error::TrackingError;
use serde::Serialize;

/// The pose everything is measured against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceState {
    pub axis: AxisSegment,
    pub samples: SampleSet,
}

/// Per-sample displacement against the reference, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeflectionResult {
    /// Displacement of each sample, index-aligned with the sample set.
    pub displacements: Vec<f64>,
    /// Arithmetic mean of `displacements`.
    pub mean: f64,
    /// Largest single displacement.
    pub max: f64,
    /// Index of the sample with the largest displacement (first one on ties).
    pub max_index: usize,
}

#[derive(Debug, Default)]
pub struct DeflectionTracker {
    reference: Option<ReferenceState>,
}

impl DeflectionTracker {
    pub fn new() -> Self {
        Self { reference: None }
    }

    /// Stores the given pose as the new reference, replacing any previous one.
    pub fn capture(&mut self, axis: AxisSegment, samples: SampleSet) -> Result<(), TrackingError> {
        if samples.is_empty() {
            return Err(TrackingError::InputValidation(
                "cannot capture a reference without sample points".into(),
            ));
        }
        tracing::info!(points = samples.len(), "reference state set");
        self.reference = Some(ReferenceState { axis, samples });
        Ok(())
    }

    /// Drops the reference. Always succeeds.
    pub fn reset(&mut self) {
        if self.reference.take().is_some() {
            tracing::info!("reference state reset");
        }
    }

    pub fn reference(&self) -> Option<&ReferenceState> {
        self.reference.as_ref()
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Displacement of `current` against the reference samples.
    pub fn compute(&self, current: &SampleSet) -> Result<DeflectionResult, TrackingError> {
        let reference = self.reference.as_ref().ok_or(TrackingError::NoReference)?;

        if current.len() != reference.samples.len() {
            return Err(TrackingError::SampleCountMismatch {
                expected: reference.samples.len(),
                got: current.len(),
            });
        }

        let displacements: Vec<f64> = current
            .iter()
            .zip(reference.samples.iter())
            .map(|(now, then)| now.distance(then))
            .collect();

        let mean = displacements.iter().sum::<f64>() / displacements.len() as f64;
        let (max_index, max) = displacements.iter().copied().enumerate().fold(
            (0, f64::NEG_INFINITY),
            |best, (i, d)| if d > best.1 { (i, d) } else { best },
        );

        Ok(DeflectionResult {
            displacements,
            mean,
            max,
            max_index,
        })
    }
}
