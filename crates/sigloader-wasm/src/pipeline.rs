//! Stand-alone image pipeline bindings.
//!
//! These run the same decode, rotate, crop, filter and encode steps the
//! widget uses, without a cropper attached. Useful for processing a file
//! the page already holds, or for checking a crop before uploading it.
//!
//! # Example
//!
//! ```typescript
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_signature(bytes);
//! const turned = rotate_signature(image, 90);
//! const cropped = crop_signature(turned, 10, 10, 945, 535);
//! const png = encode_signature_png(filter_signature(cropped, 1.2, 1.1));
//! ```

use crate::types::{js_error, JsSignatureImage};
use sigloader_core::decode::decode_image;
use sigloader_core::encode::encode_png;
use sigloader_core::filter::{apply_filters, FilterSettings};
use sigloader_core::transform::{crop_region, rotate_quarter_turns};
use wasm_bindgen::prelude::*;

/// Decode a JPEG or PNG with its EXIF orientation applied.
#[wasm_bindgen]
pub fn decode_signature(bytes: &[u8]) -> Result<JsSignatureImage, JsValue> {
    decode_image(bytes)
        .map(JsSignatureImage::from_decoded)
        .map_err(js_error)
}

/// Rotate clockwise by a multiple of 90 degrees (other angles snap to the
/// nearest quarter turn).
#[wasm_bindgen]
pub fn rotate_signature(image: &JsSignatureImage, degrees: f64) -> JsSignatureImage {
    JsSignatureImage::from_decoded(rotate_quarter_turns(&image.to_decoded(), degrees))
}

/// Cut out a pixel rectangle, clamped to the image.
#[wasm_bindgen]
pub fn crop_signature(
    image: &JsSignatureImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> JsSignatureImage {
    JsSignatureImage::from_decoded(crop_region(&image.to_decoded(), x, y, width, height))
}

/// Apply `brightness(b) contrast(c)` to the RGB channels.
#[wasm_bindgen]
pub fn filter_signature(image: &JsSignatureImage, brightness: f32, contrast: f32) -> JsSignatureImage {
    let mut decoded = image.to_decoded();
    apply_filters(&mut decoded.pixels, &FilterSettings::new(brightness, contrast));
    JsSignatureImage::from_decoded(decoded)
}

#[wasm_bindgen]
pub fn encode_signature_png(image: &JsSignatureImage) -> Result<Vec<u8>, JsValue> {
    let decoded = image.to_decoded();
    encode_png(&decoded.pixels, decoded.width, decoded.height).map_err(js_error)
}

/// CSS filter string for a live preview.
#[wasm_bindgen]
pub fn filter_css(brightness: f32, contrast: f32) -> String {
    FilterSettings::new(brightness, contrast).css()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigloader_core::decode::DecodedImage;

    fn test_image(width: u32, height: u32) -> JsSignatureImage {
        let pixels = (0..(width * height * 4) as usize)
            .map(|i| if i % 4 == 3 { 255 } else { (i % 251) as u8 })
            .collect();
        JsSignatureImage::from_decoded(DecodedImage::new(width, height, pixels))
    }

    #[test]
    fn test_rotate_swaps_dimensions() {
        let result = rotate_signature(&test_image(40, 20), 90.0);
        assert_eq!((result.width(), result.height()), (20, 40));

        let result = rotate_signature(&test_image(40, 20), 180.0);
        assert_eq!((result.width(), result.height()), (40, 20));
    }

    #[test]
    fn test_crop_clamps_to_image() {
        let result = crop_signature(&test_image(50, 30), 40, 20, 100, 100);
        assert_eq!((result.width(), result.height()), (10, 10));
    }

    #[test]
    fn test_filter_keeps_alpha() {
        let result = filter_signature(&test_image(4, 4), 1.5, 0.8);
        assert!(result.pixels().chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_full_pipeline() {
        let png = encode_signature_png(&test_image(30, 20)).unwrap();
        let decoded = decode_signature(&png).unwrap();
        let rotated = rotate_signature(&decoded, -90.0);
        let cropped = crop_signature(&rotated, 0, 0, 20, 10);
        let filtered = filter_signature(&cropped, 1.0, 1.0);

        assert_eq!((filtered.width(), filtered.height()), (20, 10));
        assert_eq!(filtered.pixels(), cropped.pixels());
    }

    #[test]
    fn test_filter_css() {
        assert_eq!(filter_css(1.0, 1.0), "brightness(1) contrast(1)");
        assert_eq!(filter_css(1.25, 0.5), "brightness(1.25) contrast(0.5)");
    }
}
