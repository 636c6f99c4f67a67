//! Signature loader WASM bindings.
//!
//! Drives `sigloader-core` from a web page: Cropper.js becomes the
//! reconciler's collaborator, animation frames drive the settle queue, and
//! uploads and clipboard writes run on the browser event loop.
//!
//! # Module Structure
//!
//! - `widget` - the `SignatureWidget` the page talks to
//! - `cropper` - Cropper.js bindings implementing the collaborator trait
//! - `pipeline` - stand-alone decode/rotate/crop/filter/encode functions
//! - `types` - JS-facing image wrapper and value conversions
//!
//! # Usage
//!
//! ```typescript
//! import init, { SignatureWidget } from 'sigloader-wasm';
//!
//! await init();
//! const widget = new SignatureWidget();
//! widget.on_change((state) => render(state));
//! ```

use wasm_bindgen::prelude::*;

mod cropper;
mod pipeline;
mod types;
mod widget;

pub use cropper::JsCropper;
pub use pipeline::{
    crop_signature, decode_signature, encode_signature_png, filter_css, filter_signature,
    rotate_signature,
};
pub use types::JsSignatureImage;
pub use widget::SignatureWidget;

/// Install the panic hook and route `log`/`tracing` records to the console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second init (e.g. hot reload) finds the logger already set
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
