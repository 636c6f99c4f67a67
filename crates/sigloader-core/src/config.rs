//! Widget configuration.
//!
//! Every field has a default so a host page can pass a partial object (or
//! nothing at all). Defaults reproduce the live widget's tuning: settle
//! delays, viewport margins and the Cropper.js construction options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{ZoomLimits, TARGET_ASPECT_RATIO};

/// Top-level configuration for a signature session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Width:height ratio enforced on the crop box.
    pub aspect_ratio: f64,
    /// Smallest accepted cropped output, in pixels on each axis.
    pub min_output_size: u32,
    /// Limits for user-initiated zoom gestures.
    pub zoom_limits: ZoomLimits,
    pub reconciler: ReconcilerConfig,
    pub cropper: CropperOptions,
    pub upload: UploadConfig,
    /// Page opened by the "open form" button once a link exists.
    pub open_form_url: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: TARGET_ASPECT_RATIO,
            min_output_size: 10,
            zoom_limits: ZoomLimits::default(),
            reconciler: ReconcilerConfig::default(),
            cropper: CropperOptions::default(),
            upload: UploadConfig::default(),
            open_form_url: "https://github.com/johantre/msword-properties-generator/actions/workflows/subscribe-or-update-provider.yml".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Cropper construction options with the crop box ratio taken from
    /// `aspect_ratio`, so the cropper and the reconciler agree.
    pub fn cropper_options(&self) -> CropperOptions {
        CropperOptions {
            aspect_ratio: self.aspect_ratio,
            ..self.cropper.clone()
        }
    }
}

/// Layout constants and settle delays used by the geometry reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconcilerConfig {
    /// Fraction of the canvas the centered crop box may occupy.
    pub crop_box_scale: f64,
    /// Animation frames to wait before fit-and-center reads the canvas.
    pub fit_frames: u32,
    /// Delay between a rotation and re-centering the crop box.
    pub rotate_settle_ms: u32,
    /// Delay between a rotate click and the follow-up fit.
    pub rotate_fit_delay_ms: u32,
    /// Delay between that fit and the final crop box re-centering.
    pub rotate_recenter_ms: u32,
    /// Delay between a container resize and the refit.
    pub resize_settle_ms: u32,
    /// Height reserved for the control panel below the cropper.
    pub controls_height: f64,
    pub margin: f64,
    pub min_viewport_height: f64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            crop_box_scale: 0.6,
            fit_frames: 2,
            rotate_settle_ms: 70,
            rotate_fit_delay_ms: 80,
            rotate_recenter_ms: 70,
            resize_settle_ms: 30,
            controls_height: 400.0,
            margin: 24.0,
            min_viewport_height: 120.0,
        }
    }
}

impl ReconcilerConfig {
    pub fn rotate_settle(&self) -> Duration {
        Duration::from_millis(self.rotate_settle_ms.into())
    }

    pub fn rotate_fit_delay(&self) -> Duration {
        Duration::from_millis(self.rotate_fit_delay_ms.into())
    }

    pub fn rotate_recenter(&self) -> Duration {
        Duration::from_millis(self.rotate_recenter_ms.into())
    }

    pub fn resize_settle(&self) -> Duration {
        Duration::from_millis(self.resize_settle_ms.into())
    }
}

/// How a drag on the cropper background behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    Crop,
    #[default]
    Move,
    None,
}

/// Construction options handed to the cropping collaborator.
///
/// Field names serialize to the Cropper.js option names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropperOptions {
    /// Filled from [`WidgetConfig::aspect_ratio`] by
    /// [`WidgetConfig::cropper_options`]; never read from a host config.
    #[serde(skip_deserializing)]
    pub aspect_ratio: f64,
    /// 0 = unrestricted, 1 = crop box inside canvas, 2/3 = canvas fills container.
    pub view_mode: u8,
    /// Initial crop box size as a fraction of the image.
    pub auto_crop_area: f64,
    pub auto_crop: bool,
    pub background: bool,
    pub responsive: bool,
    pub guides: bool,
    pub drag_mode: DragMode,
    pub movable: bool,
    pub zoomable: bool,
}

impl Default for CropperOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: TARGET_ASPECT_RATIO,
            view_mode: 1,
            auto_crop_area: 0.4,
            auto_crop: true,
            background: true,
            responsive: true,
            guides: true,
            drag_mode: DragMode::Move,
            movable: true,
            zoomable: true,
        }
    }
}

/// Where and how the cropped PNG is uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadConfig {
    pub endpoint: String,
    /// Multipart field carrying the file.
    pub field_name: String,
    pub file_name: String,
    /// Whole-request timeout; ignored in the browser, where fetch has none.
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://msword-signature-proxy.johan-tre.workers.dev/".to_string(),
            field_name: "files[]".to_string(),
            file_name: "signature.png".to_string(),
            timeout_secs: 60,
        }
    }
}
