// THEORY (single-pixel HSV):
// The `HsvPixel` is the most fundamental unit of the color mask layer. It is a
// "dumb" data container for one pixel expressed in hue-saturation-value space,
// computed from that pixel alone with no knowledge of its neighbours.
//
// Scale convention (8-bit HSV):
// - hue:        half-degrees, 0..=179 (a full turn of 360° fits in one byte)
// - saturation: 0..=255, chroma relative to value
// - value:      0..=255, the brightest of the three channels
//
// Threshold constants for the tracked actuator are written on this scale, so the
// conversion must reproduce it exactly, including rounding.

pub mod hsv_pixel {
    use image::Rgb;

    pub type Hue = u8;
    pub type Saturation = u8;
    pub type Value = u8;

    /// Largest hue on the half-degree scale.
    pub const HUE_MAX: Hue = 179;

    /// A single pixel in 8-bit HSV space.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HsvPixel {
        /// Hue in half-degrees (0-179).
        pub hue: Hue,
        /// Saturation (0-255).
        pub saturation: Saturation,
        /// Value (0-255).
        pub value: Value,
    }

    impl HsvPixel {
        pub fn new(hue: Hue, saturation: Saturation, value: Value) -> Self {
            Self {
                hue,
                saturation,
                value,
            }
        }

        /// Converts an sRGB byte triple. No gamma handling: thresholds are tuned on
        /// the encoded values the camera delivers.
        pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
            let maximum_channel = red.max(green.max(blue));
            let minimum_channel = red.min(green.min(blue));
            let chroma = (maximum_channel - minimum_channel) as f32;

            let saturation = if maximum_channel == 0 {
                0
            } else {
                (255.0 * chroma / maximum_channel as f32).round() as u8
            };

            if chroma == 0.0 {
                return Self::new(0, saturation, maximum_channel);
            }

            let (r, g, b) = (red as f32, green as f32, blue as f32);
            let (base_difference, sector_offset) = if maximum_channel == red {
                (g - b, 0.0)
            } else if maximum_channel == green {
                (b - r, 120.0)
            } else {
                (r - g, 240.0)
            };

            let mut hue_degrees = 60.0 * base_difference / chroma + sector_offset;
            if hue_degrees < 0.0 {
                hue_degrees += 360.0;
            }

            let mut hue = (hue_degrees / 2.0).round() as u16;
            if hue > HUE_MAX as u16 {
                hue = 0;
            }

            Self::new(hue as Hue, saturation, maximum_channel)
        }

        pub fn channels(&self) -> [u8; 3] {
            [self.hue, self.saturation, self.value]
        }
    }

    impl From<&Rgb<u8>> for HsvPixel {
        fn from(pixel: &Rgb<u8>) -> Self {
            let [red, green, blue] = pixel.0;
            HsvPixel::from_rgb(red, green, blue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::hsv_pixel::*;

    #[test]
    fn primaries() {
        assert_eq!(HsvPixel::from_rgb(255, 0, 0), HsvPixel::new(0, 255, 255));
        assert_eq!(HsvPixel::from_rgb(0, 255, 0), HsvPixel::new(60, 255, 255));
        assert_eq!(HsvPixel::from_rgb(0, 0, 255), HsvPixel::new(120, 255, 255));
    }

    #[test]
    fn grays_have_no_hue_or_saturation() {
        assert_eq!(HsvPixel::from_rgb(0, 0, 0), HsvPixel::new(0, 0, 0));
        assert_eq!(HsvPixel::from_rgb(128, 128, 128), HsvPixel::new(0, 0, 128));
    }

    #[test]
    fn mid_saturation_green() {
        // chroma 100 over value 200 -> saturation 127.5 -> 128
        let hsv = HsvPixel::from_rgb(100, 200, 100);
        assert_eq!(hsv.hue, 60);
        assert_eq!(hsv.saturation, 128);
        assert_eq!(hsv.value, 200);
    }

    #[test]
    fn hue_near_full_turn_wraps_to_zero() {
        // 60 * (0 - 1) / 255 + 360 = 359.76° -> 179.88 -> rounds to 180 -> wraps
        let hsv = HsvPixel::from_rgb(255, 0, 1);
        assert_eq!(hsv.hue, 0);
    }

    #[test]
    fn magenta_lands_on_upper_half() {
        let hsv = HsvPixel::from(&image::Rgb([255, 0, 255]));
        assert_eq!(hsv.hue, 150);
        assert_eq!(hsv.channels(), [150, 255, 255]);
    }
}
