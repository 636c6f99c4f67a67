//! Signature loader core.
//!
//! Platform-independent half of the signature capture widget: the geometry
//! that keeps the cropper's canvas and crop box aligned with the viewport,
//! the image pipeline (decode, rotate, crop, filter, PNG encode), the upload
//! client and the session state machine driving the widget's controls.
//!
//! The browser half lives in `sigloader-wasm`, which plugs Cropper.js into
//! [`reconcile::Collaborator`]. Everything here also runs natively, with
//! [`soft_cropper::SoftCropper`] standing in for the browser cropper.

pub mod config;
pub mod decode;
pub mod encode;
pub mod filter;
pub mod geometry;
pub mod reconcile;
pub mod session;
pub mod soft_cropper;
pub mod transform;
pub mod upload;

pub use config::{CropperOptions, DragMode, ReconcilerConfig, UploadConfig, WidgetConfig};
pub use decode::{decode_image, DecodeError, DecodedImage};
pub use encode::{encode_png, EncodeError};
pub use filter::{apply_filters, FilterSettings};
pub use geometry::{CanvasData, ContainerData, Rect, ZoomLimits, TARGET_ASPECT_RATIO};
pub use reconcile::{Collaborator, Reconciler};
pub use session::{
    Controls, CropOutcome, PendingUpload, SessionState, SignatureSession, UploadTicket,
};
pub use soft_cropper::SoftCropper;
pub use upload::{parse_upload_response, UploadError, Uploader};
