pub mod image_helper {
    use image::{ExtendedColorType, GrayImage, ImageEncoder, RgbImage};
    use std::path::Path;

    /// Writes an RGB image (e.g. a rendered overlay) as PNG.
    pub fn save_rgb(path: &Path, image: &RgbImage) -> Result<(), image::error::ImageError> {
        save_png(path, image.width(), image.height(), image.as_raw(), ExtendedColorType::Rgb8)
    }

    /// Writes a motion mask as a grayscale PNG.
    pub fn save_mask(path: &Path, mask: &GrayImage) -> Result<(), image::error::ImageError> {
        save_png(path, mask.width(), mask.height(), mask.as_raw(), ExtendedColorType::L8)
    }

    fn save_png(
        path: &Path,
        width: u32,
        height: u32,
        buffer: &[u8],
        color_type: ExtendedColorType,
    ) -> Result<(), image::error::ImageError> {
        let output = std::io::BufWriter::new(std::fs::File::create(path)?);
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(buffer, width, height, color_type)?;

        Ok(())
    }
}
