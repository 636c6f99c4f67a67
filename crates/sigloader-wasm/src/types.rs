//! WASM-compatible wrapper types and JS value conversions.

use sigloader_core::config::WidgetConfig;
use sigloader_core::decode::DecodedImage;
use sigloader_core::session::SessionState;
use wasm_bindgen::prelude::*;

/// An RGBA bitmap held in WASM memory.
///
/// `pixels()` copies the buffer out to a `Uint8Array`; keep the image on the
/// Rust side between pipeline steps to avoid repeated copies.
#[wasm_bindgen]
pub struct JsSignatureImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsSignatureImage {
    /// Wrap RGBA pixel data (4 bytes per pixel, row-major).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<JsSignatureImage, JsValue> {
        check_rgba(width, height, pixels.len()).map_err(js_error)?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsSignatureImage {
    pub(crate) fn from_decoded(image: DecodedImage) -> Self {
        Self {
            width: image.width,
            height: image.height,
            pixels: image.pixels,
        }
    }

    pub(crate) fn to_decoded(&self) -> DecodedImage {
        DecodedImage::new(self.width, self.height, self.pixels.clone())
    }
}

/// Dimensions must be non-zero and match the buffer length.
fn check_rgba(width: u32, height: u32, len: usize) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err(format!("Image dimensions must be non-zero, got {width}x{height}"));
    }
    let expected = width as usize * height as usize * 4;
    if len != expected {
        return Err(format!("Expected {expected} bytes of RGBA data, got {len}"));
    }
    Ok(())
}

pub(crate) fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

/// Read a widget configuration from a JS object. `undefined` and `null`
/// give the defaults; missing fields fall back individually.
pub(crate) fn config_from_js(value: JsValue) -> Result<WidgetConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(WidgetConfig::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(js_error)
}

pub(crate) fn state_to_js(state: &SessionState) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(state).map_err(js_error)
}
