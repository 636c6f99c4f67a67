//! Image transformation operations: quarter-turn rotation and cropping.
//!
//! # Transform Order
//!
//! When producing the upload, transforms are applied in this order:
//! 1. Rotation (multiples of 90 degrees only)
//! 2. Crop (pixel region in rotated coordinates)
//! 3. Brightness / contrast filter
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = clockwise (as the cropper
//!   reports them)
//! - Crop coordinates are pixels of the rotated image
//! - Origin is top-left corner

mod crop;
mod rotation;

pub use crop::crop_region;
pub use rotation::{rotate_quarter_turns, rotated_dimensions, QuarterTurn};
