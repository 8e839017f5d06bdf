// THEORY:
// The `ColorMaskFilter` is the entry point of the per-frame pipeline. It turns a
// color frame into a binary mask marking every pixel whose HSV coordinates fall
// inside the configured `ColorRange`.
//
// Key architectural principles:
// 1.  **Stateless**: The filter holds only immutable configuration. The same frame
//     always yields the same mask.
// 2.  **Closed intervals**: A pixel is set iff all three of its HSV channels lie in
//     `[lower, upper]`, bounds included.
// 3.  **Cleanup**: Sensor noise produces speckles on the mask. An erode pass
//     removes isolated set pixels and a dilate pass restores the body of the
//     actuator, closing small gaps along the way.
// 4.  **Mask format**: The output is a `GrayImage` of the frame's dimensions with
//     `MASK_SET` (255) for set pixels and `MASK_CLEAR` (0) elsewhere, so it can be
//     written straight to disk for inspection.

use crate::core_modules::error::TrackingError;
use crate::core_modules::hsv_pixel::hsv_pixel::{HUE_MAX, HsvPixel};
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate_mut, erode_mut};
use serde::{Deserialize, Serialize};

pub const MASK_SET: u8 = 255;
pub const MASK_CLEAR: u8 = 0;

/// Inclusive bounds in (hue, saturation, value) space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Result<Self, TrackingError> {
        let range = Self { lower, upper };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), TrackingError> {
        for (channel, (lo, hi)) in ["hue", "saturation", "value"]
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
        {
            if lo > hi {
                return Err(TrackingError::InputValidation(format!(
                    "{} lower bound {} exceeds upper bound {}",
                    channel, lo, hi
                )));
            }
        }
        if self.upper[0] > HUE_MAX {
            return Err(TrackingError::InputValidation(format!(
                "hue upper bound {} exceeds {}",
                self.upper[0], HUE_MAX
            )));
        }
        Ok(())
    }

    pub fn contains(&self, pixel: &HsvPixel) -> bool {
        pixel
            .channels()
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(c, (lo, hi))| lo <= c && c <= hi)
    }
}

impl Default for ColorRange {
    /// The green actuator range the rig was tuned for.
    fn default() -> Self {
        Self {
            lower: [41, 99, 102],
            upper: [179, 255, 255],
        }
    }
}

/// Number of erode and dilate passes applied after thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyConfig {
    pub erode_iterations: u32,
    pub dilate_iterations: u32,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            erode_iterations: 1,
            dilate_iterations: 2,
        }
    }
}

impl MorphologyConfig {
    pub fn disabled() -> Self {
        Self {
            erode_iterations: 0,
            dilate_iterations: 0,
        }
    }
}

/// Builds an `RgbImage` from a packed RGB or RGBA byte buffer, validating the
/// dimensions against the buffer length.
pub fn frame_from_raw(
    buffer: &[u8],
    width: u32,
    height: u32,
    channels: u32,
) -> Result<RgbImage, TrackingError> {
    if width == 0 || height == 0 {
        return Err(TrackingError::InputValidation(format!(
            "frame dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    if channels != 3 && channels != 4 {
        return Err(TrackingError::InputValidation(format!(
            "expected 3 or 4 channels, got {}",
            channels
        )));
    }
    let expected = width as usize * height as usize * channels as usize;
    if buffer.len() != expected {
        return Err(TrackingError::InputValidation(format!(
            "buffer holds {} bytes, {}x{}x{} frame needs {}",
            buffer.len(),
            width,
            height,
            channels,
            expected
        )));
    }

    let rgb: Vec<u8> = if channels == 3 {
        buffer.to_vec()
    } else {
        buffer
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect()
    };

    RgbImage::from_raw(width, height, rgb).ok_or_else(|| {
        TrackingError::InputValidation("frame buffer does not match dimensions".into())
    })
}

/// Produces binary masks of the pixels inside a `ColorRange`.
#[derive(Debug, Clone)]
pub struct ColorMaskFilter {
    range: ColorRange,
    morphology: MorphologyConfig,
}

impl ColorMaskFilter {
    pub fn new(range: ColorRange, morphology: MorphologyConfig) -> Result<Self, TrackingError> {
        range.validate()?;
        Ok(Self { range, morphology })
    }

    pub fn range(&self) -> &ColorRange {
        &self.range
    }

    /// Threshold followed by the configured erode/dilate passes.
    pub fn apply(&self, frame: &RgbImage) -> Result<GrayImage, TrackingError> {
        let mut mask = self.threshold(frame)?;
        // LInf with k = 1 is the 3x3 square kernel. Pixels outside the frame
        // count as neither set nor clear.
        for _ in 0..self.morphology.erode_iterations {
            erode_mut(&mut mask, Norm::LInf, 1);
        }
        for _ in 0..self.morphology.dilate_iterations {
            dilate_mut(&mut mask, Norm::LInf, 1);
        }
        Ok(mask)
    }

    /// The raw range test, without cleanup.
    pub fn threshold(&self, frame: &RgbImage) -> Result<GrayImage, TrackingError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(TrackingError::InputValidation(format!(
                "frame dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }

        let mut mask = GrayImage::new(width, height);
        for (src, dst) in frame.pixels().zip(mask.pixels_mut()) {
            let hsv = HsvPixel::from(src);
            *dst = if self.range.contains(&hsv) {
                Luma([MASK_SET])
            } else {
                Luma([MASK_CLEAR])
            };
        }
        Ok(mask)
    }
}
