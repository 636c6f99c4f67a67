//! Pixel-space cropping.
//!
//! The crop box arrives from the cropper in canvas coordinates and is mapped
//! back to natural pixels before it gets here, so this module only deals
//! with integer pixel rectangles.

use crate::decode::DecodedImage;

/// Crop a pixel region out of an image.
///
/// # Behavior
///
/// - The origin is clamped into the image
/// - The region is clipped at the right and bottom edges
/// - Minimum output dimension is 1x1 pixels
/// - A region covering the whole image returns a copy
/// - An empty image has nothing to crop and is returned as is
pub fn crop_region(image: &DecodedImage, x: u32, y: u32, width: u32, height: u32) -> DecodedImage {
    if image.is_empty() {
        return image.clone();
    }
    if x == 0 && y == 0 && width >= image.width && height >= image.height {
        return image.clone();
    }

    let left = x.min(image.width.saturating_sub(1));
    let top = y.min(image.height.saturating_sub(1));
    let right = left.saturating_add(width).min(image.width);
    let bottom = top.saturating_add(height).min(image.height);

    let out_width = right.saturating_sub(left).max(1);
    let out_height = bottom.saturating_sub(top).max(1);

    let src_stride = image.width as usize * 4;
    let row_bytes = out_width as usize * 4;
    let mut output = Vec::with_capacity(row_bytes * out_height as usize);

    // Whole rows are contiguous in RGBA, so copy slices instead of pixels
    for row in top..top + out_height {
        let start = row as usize * src_stride + left as usize * 4;
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }

    DecodedImage::new(out_width, out_height, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image where each pixel encodes its position.
    fn test_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_crop_empty_image() {
        let empty = DecodedImage::new(0, 0, vec![]);

        let result = crop_region(&empty, 1, 0, 5, 5);
        assert_eq!(result, empty);

        let result = crop_region(&empty, 0, 0, 0, 0);
        assert!(result.is_empty());
    }

    #[test]
    fn test_full_crop() {
        let img = test_image(100, 100);
        let result = crop_region(&img, 0, 0, 100, 100);
        assert_eq!(result, img);
    }

    #[test]
    fn test_center_crop() {
        let img = test_image(10, 10);
        let result = crop_region(&img, 2, 2, 6, 6);

        assert_eq!(result.width, 6);
        assert_eq!(result.height, 6);
        // Value at (2, 2) = 2 * 10 + 2
        assert_eq!(result.pixel(0, 0), [22, 22, 22, 255]);
        // Value at (7, 7) = 77
        assert_eq!(result.pixel(5, 5), [77, 77, 77, 255]);
    }

    #[test]
    fn test_crop_clips_at_edges() {
        let img = test_image(10, 10);
        let result = crop_region(&img, 8, 8, 5, 5);

        assert_eq!(result.width, 2);
        assert_eq!(result.height, 2);
    }

    #[test]
    fn test_crop_origin_outside_image() {
        let img = test_image(10, 10);
        let result = crop_region(&img, 50, 50, 5, 5);

        assert_eq!(result.width, 1);
        assert_eq!(result.height, 1);
        assert_eq!(result.pixel(0, 0), [99, 99, 99, 255]);
    }

    #[test]
    fn test_crop_minimum_dimension() {
        let img = test_image(10, 10);
        let result = crop_region(&img, 3, 3, 0, 0);

        assert_eq!(result.width, 1);
        assert_eq!(result.height, 1);
    }

    #[test]
    fn test_crop_rectangular() {
        let img = test_image(200, 100);
        let result = crop_region(&img, 0, 0, 50, 100);

        assert_eq!(result.width, 50);
        assert_eq!(result.height, 100);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
