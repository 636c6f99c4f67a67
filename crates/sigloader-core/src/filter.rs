//! Brightness and contrast filters.
//!
//! Filters follow the CSS `filter` functions the live preview uses, so the
//! uploaded PNG looks like what the user saw on screen.
//!
//! ## Filter Order
//! 1. `brightness(b)`: `output = input * b`
//! 2. `contrast(c)`: `output = (input - 0.5) * c + 0.5`
//!
//! Alpha is never touched.

use serde::{Deserialize, Serialize};

/// Brightness and contrast scalars, 1.0 meaning unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Brightness multiplier (0.0 = black, 1.0 = unchanged)
    pub brightness: f32,
    /// Contrast multiplier (0.0 = flat grey, 1.0 = unchanged)
    pub contrast: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
        }
    }
}

impl FilterSettings {
    /// Create new settings with explicit values; negatives are clamped to 0
    /// like CSS does.
    pub fn new(brightness: f32, contrast: f32) -> Self {
        Self {
            brightness: brightness.max(0.0),
            contrast: contrast.max(0.0),
        }
    }

    /// Check if both filters are at their defaults
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// CSS filter string for the live preview.
    pub fn css(&self) -> String {
        format!(
            "brightness({}) contrast({})",
            self.brightness, self.contrast
        )
    }
}

/// Apply brightness then contrast to RGBA pixel data in place.
///
/// # Example
/// ```
/// use sigloader_core::filter::{apply_filters, FilterSettings};
///
/// let mut pixels = vec![100, 100, 100, 255];
/// apply_filters(&mut pixels, &FilterSettings::new(2.0, 1.0));
/// assert_eq!(pixels, vec![200, 200, 200, 255]);
/// ```
pub fn apply_filters(pixels: &mut [u8], settings: &FilterSettings) {
    if settings.is_identity() {
        return;
    }

    let lut = build_lut(settings);
    for chunk in pixels.chunks_exact_mut(4) {
        chunk[0] = lut[chunk[0] as usize];
        chunk[1] = lut[chunk[1] as usize];
        chunk[2] = lut[chunk[2] as usize];
    }
}

/// Both filters act per channel, so a 256-entry table covers every input.
fn build_lut(settings: &FilterSettings) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        let v = i as f32 / 255.0;
        let v = apply_brightness(v, settings.brightness);
        let v = apply_contrast(v, settings.contrast);
        *slot = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    lut
}

#[inline]
fn apply_brightness(v: f32, brightness: f32) -> f32 {
    // CSS clamps intermediate results between filter functions
    (v * brightness).clamp(0.0, 1.0)
}

#[inline]
fn apply_contrast(v: f32, contrast: f32) -> f32 {
    (v - 0.5) * contrast + 0.5
}
