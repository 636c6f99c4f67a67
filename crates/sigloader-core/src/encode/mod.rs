//! Image encoding for upload.
//!
//! The upload endpoint receives the filtered crop as a PNG so the signature
//! keeps sharp edges and its alpha channel.

mod png;

pub use png::{encode_png, EncodeError};
