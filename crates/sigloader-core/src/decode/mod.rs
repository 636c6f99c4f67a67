//! Image decoding for picked or snapped signature photos.
//!
//! Decoding produces RGBA pixels with EXIF orientation already applied, the
//! same bitmap a browser would hand to the cropper.
//!
//! # Examples
//!
//! ```ignore
//! use sigloader_core::decode::decode_image;
//!
//! let bytes = std::fs::read("signature.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod reader;
mod types;

pub use reader::decode_image;
pub use types::{DecodeError, DecodedImage};

use types::Orientation;
