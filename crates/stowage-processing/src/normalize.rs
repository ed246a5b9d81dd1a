use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use thiserror::Error;

/// Largest edge allowed after normalization, in pixels.
pub const MAX_DIMENSION: u32 = 800;

/// Re-encode quality. Normalized files are served as-is, so no further
/// generation loss is acceptable here.
const JPEG_QUALITY: u8 = 100;

#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The payload is not a decodable image (wrong bytes, truncated file).
    /// Callers treat this as a data problem, not an infrastructure failure.
    #[error("unrecognizable image data: {0}")]
    BadImage(String),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result of a successful normalization pass.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Decode, strip alpha, bound the largest edge and re-encode as JPEG.
pub struct ImageNormalizer;

impl ImageNormalizer {
    /// Normalize encoded image bytes.
    ///
    /// The input format is sniffed from the bytes; output is always JPEG.
    /// Images already within [`MAX_DIMENSION`] keep their dimensions but
    /// are still converted to RGB JPEG.
    pub fn normalize(data: &[u8]) -> Result<NormalizedImage, ProcessingError> {
        let reader = image::ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let img = match reader.decode() {
            Ok(img) => img,
            Err(image::ImageError::IoError(err)) => return Err(ProcessingError::Io(err)),
            Err(err) => return Err(ProcessingError::BadImage(err.to_string())),
        };

        // JPEG carries no alpha channel, so drop it up front.
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        let rgb = if width.max(height) > MAX_DIMENSION {
            let ratio = MAX_DIMENSION as f64 / width.max(height) as f64;
            let new_width = ((width as f64 * ratio) as u32).max(1);
            let new_height = ((height as f64 * ratio) as u32).max(1);
            image::imageops::resize(&rgb, new_width, new_height, FilterType::Lanczos3)
        } else {
            rgb
        };

        let (width, height) = rgb.dimensions();
        let mut buffer = Vec::with_capacity((width * height * 3) as usize);
        let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
        rgb.write_with_encoder(encoder)?;

        Ok(NormalizedImage {
            bytes: Bytes::from(buffer),
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32, pixel: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, pixel);
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn shrinks_oversized_image_preserving_aspect_ratio() {
        let data = png_bytes(1600, 3200, Rgba([255, 0, 0, 255]));

        let normalized = ImageNormalizer::normalize(&data).unwrap();

        assert_eq!(normalized.width, 400);
        assert_eq!(normalized.height, 800);
        assert_eq!(
            image::guess_format(&normalized.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn truncates_fractional_dimensions() {
        let data = png_bytes(801, 400, Rgba([0, 255, 0, 255]));

        let normalized = ImageNormalizer::normalize(&data).unwrap();

        // 400 * 800/801 = 399.5, truncated.
        assert_eq!(normalized.width, 800);
        assert_eq!(normalized.height, 399);
    }

    #[test]
    fn small_image_keeps_dimensions_but_becomes_jpeg() {
        let data = png_bytes(100, 50, Rgba([0, 0, 255, 255]));

        let normalized = ImageNormalizer::normalize(&data).unwrap();

        assert_eq!(normalized.width, 100);
        assert_eq!(normalized.height, 50);
        assert_eq!(
            image::guess_format(&normalized.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn exactly_at_bound_is_left_alone() {
        let data = png_bytes(800, 600, Rgba([10, 20, 30, 255]));

        let normalized = ImageNormalizer::normalize(&data).unwrap();

        assert_eq!(normalized.width, 800);
        assert_eq!(normalized.height, 600);
    }

    #[test]
    fn strips_alpha_channel() {
        let data = png_bytes(10, 10, Rgba([255, 0, 0, 128]));

        let normalized = ImageNormalizer::normalize(&data).unwrap();

        let decoded = image::ImageReader::new(Cursor::new(normalized.bytes.as_ref()))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn garbage_bytes_are_a_bad_image() {
        let err = ImageNormalizer::normalize(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ProcessingError::BadImage(_)));
    }

    #[test]
    fn truncated_file_is_a_bad_image() {
        let data = png_bytes(64, 64, Rgba([1, 2, 3, 255]));

        let err = ImageNormalizer::normalize(&data[..20]).unwrap_err();
        assert!(matches!(err, ProcessingError::BadImage(_)));
    }

    #[test]
    fn empty_input_is_a_bad_image() {
        let err = ImageNormalizer::normalize(&[]).unwrap_err();
        assert!(matches!(err, ProcessingError::BadImage(_)));
    }
}
