pub mod image_helper {
    use image::{GrayImage, ImageEncoder};
    use std::path::Path;

    /// Writes a binary mask as an 8-bit grayscale PNG.
    pub fn save_mask(path: impl AsRef<Path>, mask: &GrayImage) -> Result<(), image::ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            mask.as_raw(),
            mask.width(),
            mask.height(),
            image::ExtendedColorType::L8,
        )?;

        Ok(())
    }
}
