//! Widget session: everything the UI controller needs between events.
//!
//! A [`SignatureSession`] owns the reconciler (and through it the cropping
//! collaborator), the filter sliders, the enabled state of every control,
//! the status line, the cropped PNG waiting for upload and the link the
//! upload produced. Event handlers take it by `&mut` reference; there is no
//! other widget state.
//!
//! Asynchronous work (upload, clipboard) is split into a `begin`/`finish`
//! pair so the host can await it however its runtime allows.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::WidgetConfig;
use crate::encode::encode_png;
use crate::filter::{apply_filters, FilterSettings};
use crate::reconcile::{Collaborator, Reconciler};
use crate::upload::UploadError;

pub const STATUS_CROP_TOO_SMALL: &str = "Please select a larger crop area.";
pub const STATUS_PROCESSING_FAILED: &str = "Error while processing image.";
pub const STATUS_READY: &str = "Ready to upload";
pub const STATUS_UPLOADING: &str = "Uploading...";
pub const STATUS_UPLOAD_COMPLETE: &str = "Upload Complete. Link copied ...";
pub const STATUS_UPLOAD_COMPLETE_NO_COPY: &str = "Upload Complete. Failed to copy link.";
pub const STATUS_LINK_COPIED: &str = "Link copied to clipboard.";
pub const STATUS_COPY_FAILED: &str = "Failed to copy link.";

/// Enabled/visible flags for the widget's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    pub brightness: bool,
    pub contrast: bool,
    pub rotate: bool,
    pub crop: bool,
    pub upload: bool,
    pub copy_link: bool,
    /// Cropper, sliders and action buttons are shown.
    pub editor_visible: bool,
    /// Link, copy and open-form buttons are shown.
    pub share_visible: bool,
}

impl Controls {
    fn set_editing(&mut self, enabled: bool) {
        self.brightness = enabled;
        self.contrast = enabled;
        self.rotate = enabled;
        self.crop = enabled;
    }
}

/// Result of pressing the crop button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropOutcome {
    /// A PNG is ready for upload.
    Ready { width: u32, height: u32, bytes: usize },
    /// The crop was below the minimum size; any earlier PNG is discarded.
    TooSmall,
    /// Filtering or encoding failed.
    ProcessingFailed,
    /// No image is loaded.
    NoImage,
    /// Cropping is switched off, e.g. while an upload runs.
    Disabled,
}

/// Identifies the image an upload was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
}

/// An upload handed out by [`SignatureSession::begin_upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub ticket: UploadTicket,
    pub png: Vec<u8>,
}

/// Serializable snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: String,
    pub controls: Controls,
    pub link: Option<String>,
    pub filter_css: String,
    pub rotation: i32,
    pub viewport_height: f64,
}

pub struct SignatureSession<C> {
    config: WidgetConfig,
    reconciler: Reconciler<C>,
    filters: FilterSettings,
    controls: Controls,
    status: String,
    cropped_png: Option<Vec<u8>>,
    link: Option<String>,
    uploading: bool,
    /// Bumped whenever the image changes; stale upload results are dropped.
    generation: u64,
    viewport_height: f64,
}

impl<C: Collaborator> SignatureSession<C> {
    pub fn new(config: WidgetConfig) -> Self {
        let reconciler = Reconciler::new(config.reconciler.clone(), config.aspect_ratio);
        let viewport_height = config.reconciler.min_viewport_height;
        Self {
            config,
            reconciler,
            filters: FilterSettings::default(),
            controls: Controls::default(),
            status: String::new(),
            cropped_png: None,
            link: None,
            uploading: false,
            generation: 0,
            viewport_height,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn filters(&self) -> FilterSettings {
        self.filters
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn cropped_png(&self) -> Option<&[u8]> {
        self.cropped_png.as_deref()
    }

    pub fn reconciler(&self) -> &Reconciler<C> {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler<C> {
        &mut self.reconciler
    }

    pub fn has_pending(&self) -> bool {
        self.reconciler.has_pending()
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            status: self.status.clone(),
            controls: self.controls,
            link: self.link.clone(),
            filter_css: self.filters.css(),
            rotation: self.reconciler.rotation(),
            viewport_height: self.viewport_height,
        }
    }

    /// Start editing a freshly loaded image.
    ///
    /// Any previous collaborator is destroyed and every per-image piece of
    /// state (filters, cropped PNG, link, status) is reset.
    pub fn load_image(&mut self, collaborator: C) {
        self.reconciler.attach(collaborator);
        self.reset_image_state();
        self.controls.set_editing(true);
        self.controls.editor_visible = true;
        info!("signature image loaded");
    }

    /// Destroy the current collaborator and go back to the empty widget.
    ///
    /// Hosts whose cropper binds to a DOM element call this before building
    /// the next collaborator on the same element.
    pub fn unload(&mut self) {
        self.reconciler.detach();
        self.reset_image_state();
        self.controls.set_editing(false);
        self.controls.editor_visible = false;
    }

    fn reset_image_state(&mut self) {
        self.generation += 1;
        self.filters = FilterSettings::default();
        self.cropped_png = None;
        self.link = None;
        self.uploading = false;
        self.status.clear();
        self.controls.upload = false;
        self.controls.copy_link = false;
        self.controls.share_visible = false;
    }

    /// The collaborator finished its own first layout.
    pub fn on_ready(&mut self) {
        self.reconciler.on_ready();
    }

    /// Window resized; returns the new viewport height for the container.
    pub fn resize(&mut self, window_height: f64) -> f64 {
        self.viewport_height = self.reconciler.resize_cropper_container(window_height);
        self.viewport_height
    }

    pub fn rotate_left(&mut self) {
        if self.controls.rotate {
            self.reconciler.rotate_clicked(-90);
        }
    }

    pub fn rotate_right(&mut self) {
        if self.controls.rotate {
            self.reconciler.rotate_clicked(90);
        }
    }

    pub fn tick(&mut self, now: Duration) {
        self.reconciler.tick(now);
    }

    pub fn sync_clock(&mut self, now: Duration) {
        self.reconciler.sync_clock(now);
    }

    /// Update brightness; returns the CSS filter for the live preview.
    pub fn set_brightness(&mut self, value: f32) -> String {
        self.filters = FilterSettings::new(value, self.filters.contrast);
        self.filters.css()
    }

    /// Update contrast; returns the CSS filter for the live preview.
    pub fn set_contrast(&mut self, value: f32) -> String {
        self.filters = FilterSettings::new(self.filters.brightness, value);
        self.filters.css()
    }

    /// Cut the crop box out, apply the filters and encode the PNG.
    pub fn crop(&mut self) -> CropOutcome {
        if self.reconciler.collaborator().is_none() {
            return CropOutcome::NoImage;
        }
        if !self.controls.crop {
            return CropOutcome::Disabled;
        }
        let Some(mut image) = self
            .reconciler
            .collaborator()
            .and_then(Collaborator::cropped_image)
        else {
            return CropOutcome::NoImage;
        };

        let min = self.config.min_output_size;
        if image.width < min || image.height < min {
            debug!(width = image.width, height = image.height, "crop below minimum size");
            self.status = STATUS_CROP_TOO_SMALL.to_string();
            self.cropped_png = None;
            self.controls.upload = false;
            return CropOutcome::TooSmall;
        }

        apply_filters(&mut image.pixels, &self.filters);
        match encode_png(&image.pixels, image.width, image.height) {
            Ok(png) => {
                let bytes = png.len();
                self.cropped_png = Some(png);
                self.controls.upload = true;
                self.status = STATUS_READY.to_string();
                info!(width = image.width, height = image.height, bytes, "crop ready for upload");
                CropOutcome::Ready {
                    width: image.width,
                    height: image.height,
                    bytes,
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to encode crop");
                self.status = STATUS_PROCESSING_FAILED.to_string();
                CropOutcome::ProcessingFailed
            }
        }
    }

    /// Lock the widget for upload and hand out the PNG to send.
    ///
    /// Returns `None` when nothing has been cropped yet or an upload is
    /// already running. The ticket goes back in with the result.
    pub fn begin_upload(&mut self) -> Option<PendingUpload> {
        if self.uploading {
            return None;
        }
        let png = self.cropped_png.clone()?;

        self.uploading = true;
        self.status = STATUS_UPLOADING.to_string();
        self.controls.set_editing(false);
        self.controls.upload = false;
        if let Some(collaborator) = self.reconciler.collaborator_mut() {
            collaborator.disable();
        }
        Some(PendingUpload {
            ticket: UploadTicket {
                generation: self.generation,
            },
            png,
        })
    }

    fn is_stale(&self, ticket: UploadTicket) -> bool {
        if ticket.generation == self.generation {
            return false;
        }
        debug!(
            ticket = ticket.generation,
            current = self.generation,
            "dropping result for a replaced image"
        );
        true
    }

    /// Apply the upload result. On success returns the link, which the host
    /// should write to the clipboard and report via
    /// [`upload_link_copied`](Self::upload_link_copied). Results for an
    /// image that has since been replaced are ignored.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<String, UploadError>,
    ) -> Option<String> {
        if self.is_stale(ticket) {
            return None;
        }
        self.uploading = false;
        match result {
            Ok(link) => {
                self.link = Some(link.clone());
                Some(link)
            }
            Err(e) => {
                warn!(error = %e, "upload failed");
                self.controls.set_editing(true);
                self.controls.upload = true;
                if let Some(collaborator) = self.reconciler.collaborator_mut() {
                    collaborator.enable();
                }
                self.status = format!("Error while uploading: {e}");
                None
            }
        }
    }

    /// The post-upload clipboard write finished.
    pub fn upload_link_copied(&mut self, ticket: UploadTicket, result: Result<(), String>) {
        if self.is_stale(ticket) {
            return;
        }
        self.status = match result {
            Ok(()) => STATUS_UPLOAD_COMPLETE.to_string(),
            Err(e) => {
                warn!(error = %e, "clipboard write failed");
                STATUS_UPLOAD_COMPLETE_NO_COPY.to_string()
            }
        };
        self.controls.share_visible = true;
        self.controls.copy_link = true;
    }

    /// Link to copy when the copy button is pressed, if there is one.
    pub fn copy_link(&self) -> Option<String> {
        self.link.clone()
    }

    /// The copy-button clipboard write finished.
    pub fn link_copied(&mut self, result: Result<(), String>) {
        self.status = match result {
            Ok(()) => STATUS_LINK_COPIED.to_string(),
            Err(e) => {
                warn!(error = %e, "clipboard write failed");
                STATUS_COPY_FAILED.to_string()
            }
        };
    }
}
