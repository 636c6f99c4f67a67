//! PNG encoding of the filtered crop.

use image::codecs::png::PngEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use thiserror::Error;

/// Errors that can occur during PNG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode RGBA pixel data to PNG bytes.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_png_basic() {
        let pixels = vec![128u8; 40 * 20 * 4];
        let png = encode_png(&pixels, 40, 20).unwrap();

        assert_eq!(&png[..8], &PNG_SIGNATURE);
        // IEND chunk closes every PNG stream
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn test_encode_png_keeps_alpha() {
        let mut pixels = vec![0u8; 2 * 2 * 4];
        pixels[3] = 255;
        let png = encode_png(&pixels, 2, 2).unwrap();

        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(1, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_png_zero_width() {
        let result = encode_png(&[], 0, 100);
        assert!(matches!(
            result,
            Err(EncodeError::InvalidDimensions {
                width: 0,
                height: 100
            })
        ));
    }

    #[test]
    fn test_encode_png_wrong_length() {
        let pixels = vec![0u8; 10 * 10 * 3];
        let result = encode_png(&pixels, 10, 10);
        assert!(matches!(
            result,
            Err(EncodeError::InvalidPixelData {
                expected: 400,
                actual: 300
            })
        ));
    }

    #[test]
    fn test_encode_error_display() {
        let err = EncodeError::InvalidDimensions {
            width: 0,
            height: 5,
        };
        assert_eq!(
            err.to_string(),
            "Invalid dimensions: width (0) and height (5) must be non-zero"
        );
    }
}
