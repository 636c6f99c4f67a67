//! Geometry reconciliation between the viewport, the image canvas and the
//! crop box.
//!
//! The [`Reconciler`] drives a cropping [`Collaborator`] so that, after every
//! load, rotation and window resize, the canvas is fully visible and centered
//! in the viewport and the crop box sits centered on the canvas with the
//! target aspect ratio.
//!
//! # Sequencing
//!
//! The collaborator lays itself out asynchronously. Each operation is
//! therefore a short sequence of steps separated by settle waits (animation
//! frames or timer delays), executed by [`Reconciler::tick`]. Starting an
//! operation again supersedes its previous in-flight sequence, so a double
//! click on rotate never applies geometry read from a stale layout.
//!
//! Every operation is a silent no-op while no collaborator is attached.

mod settle;

use std::time::Duration;

use tracing::debug;

use crate::config::ReconcilerConfig;
use crate::decode::DecodedImage;
use crate::geometry::{self, CanvasData, ContainerData, Rect};

pub use settle::{Deadline, SequenceKind, SequenceToken, SettleQueue};

/// The cropping component the reconciler steers.
///
/// Mirrors the subset of the Cropper.js API the widget relies on. Setters
/// may be ignored by the implementation (for example while disabled); the
/// reconciler always reads geometry back instead of assuming a write stuck.
pub trait Collaborator {
    fn container_data(&self) -> Option<ContainerData>;
    /// Resize the container element the cropper lives in.
    fn set_container_height(&mut self, height: f64);
    fn canvas_data(&self) -> Option<CanvasData>;
    fn set_canvas_data(&mut self, rect: Rect);
    fn crop_box_data(&self) -> Option<Rect>;
    fn set_crop_box_data(&mut self, rect: Rect);
    fn set_aspect_ratio(&mut self, ratio: f64);
    /// Rotate by a relative angle in degrees.
    fn rotate(&mut self, degrees: f64);
    /// Rotate to an absolute angle in degrees.
    fn rotate_to(&mut self, degrees: f64);
    /// Zoom the canvas to an absolute ratio of its natural size.
    fn zoom_to(&mut self, ratio: f64);
    /// Move the canvas so its top-left corner is at the given offset.
    fn move_to(&mut self, left: f64, top: f64);
    fn enable(&mut self);
    fn disable(&mut self);
    /// The crop box contents at natural resolution.
    fn cropped_image(&self) -> Option<DecodedImage>;
    /// Release resources; called before the collaborator is replaced.
    fn destroy(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    FitAndCenter,
    FitZoom,
    FitMove,
    CenterCropBox { scale: f64 },
}

/// Keeps viewport, canvas and crop box aligned for one collaborator.
#[derive(Debug)]
pub struct Reconciler<C> {
    collaborator: Option<C>,
    rotation: i32,
    aspect_ratio: f64,
    config: ReconcilerConfig,
    queue: SettleQueue<Step>,
}

impl<C: Collaborator> Reconciler<C> {
    pub fn new(config: ReconcilerConfig, aspect_ratio: f64) -> Self {
        Self {
            collaborator: None,
            rotation: 0,
            aspect_ratio,
            config,
            queue: SettleQueue::new(),
        }
    }

    /// Take ownership of a new collaborator, destroying the previous one.
    ///
    /// Rotation resets to zero and every in-flight sequence is dropped.
    pub fn attach(&mut self, collaborator: C) {
        if let Some(mut previous) = self.collaborator.replace(collaborator) {
            previous.destroy();
        }
        self.rotation = 0;
        self.queue.cancel_all();
    }

    /// Destroy and drop the current collaborator, if any.
    pub fn detach(&mut self) {
        if let Some(mut previous) = self.collaborator.take() {
            previous.destroy();
        }
        self.queue.cancel_all();
    }

    pub fn collaborator(&self) -> Option<&C> {
        self.collaborator.as_ref()
    }

    pub fn collaborator_mut(&mut self) -> Option<&mut C> {
        self.collaborator.as_mut()
    }

    /// Accumulated rotation in degrees, always in [0, 360).
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Whether any deferred step is still waiting.
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Bring the settle clock up to `now` before handling an event.
    pub fn sync_clock(&mut self, now: Duration) {
        self.queue.sync_clock(now);
    }

    /// Initial layout once the collaborator reports it is ready.
    pub fn on_ready(&mut self) {
        self.fit_and_center();
        self.center_crop_box(self.config.crop_box_scale);
    }

    /// Zoom the canvas to fit the viewport, then center it.
    ///
    /// Reads happen after `fit_frames` frames; the centering move one frame
    /// after the zoom, once the new canvas size is observable.
    pub fn fit_and_center(&mut self) {
        if self.collaborator.is_none() {
            return;
        }
        let token = self.queue.begin(SequenceKind::Fit);
        self.queue
            .schedule(token, Deadline::Frames(self.config.fit_frames), Step::FitZoom);
    }

    /// Place a crop box of the target ratio, `scale` of the canvas in size,
    /// centered on the canvas. Returns the box that was written.
    pub fn center_crop_box(&mut self, scale: f64) -> Option<Rect> {
        let ratio = self.aspect_ratio;
        let collaborator = self.collaborator.as_mut()?;
        let canvas = collaborator.canvas_data()?;

        let crop_box = geometry::center_crop_box(&canvas.rect(), scale, ratio);
        collaborator.set_aspect_ratio(ratio);
        collaborator.set_crop_box_data(crop_box);
        Some(crop_box)
    }

    /// Rotate by `degrees` and re-center the crop box once the rotation has
    /// settled.
    pub fn rotate_and_fit(&mut self, degrees: i32) {
        if self.collaborator.is_none() {
            return;
        }
        let token = self.queue.begin(SequenceKind::Rotate);
        self.rotate_in(token, degrees);
    }

    /// Full rotate-button sequence: rotate, re-center the crop box, refit the
    /// canvas to the viewport and re-center the crop box on the fitted canvas.
    pub fn rotate_clicked(&mut self, degrees: i32) {
        if self.collaborator.is_none() {
            return;
        }
        let token = self.queue.begin(SequenceKind::Rotate);
        self.rotate_in(token, degrees);

        let fit_at = self.config.rotate_fit_delay();
        let recenter_at = fit_at + self.config.rotate_recenter();
        self.queue.schedule(token, delay(fit_at), Step::FitAndCenter);
        self.queue.schedule(
            token,
            delay(recenter_at),
            Step::CenterCropBox {
                scale: self.config.crop_box_scale,
            },
        );
    }

    fn rotate_in(&mut self, token: SequenceToken, degrees: i32) {
        let Some(collaborator) = self.collaborator.as_mut() else {
            return;
        };
        self.rotation = geometry::normalize_rotation(self.rotation, degrees);
        collaborator.rotate_to(f64::from(self.rotation));
        debug!(rotation = self.rotation, "rotated canvas");

        self.queue.schedule(
            token,
            delay(self.config.rotate_settle()),
            Step::CenterCropBox {
                scale: self.config.crop_box_scale,
            },
        );
    }

    /// Recompute the viewport height for a window of `window_height` pixels
    /// and refit the canvas once the container has resized.
    ///
    /// The height is computed (and returned) even without a collaborator so
    /// the host can size the empty container.
    pub fn resize_cropper_container(&mut self, window_height: f64) -> f64 {
        let height = geometry::viewport_height(
            window_height,
            self.config.controls_height,
            self.config.margin,
            self.config.min_viewport_height,
        );

        if let Some(collaborator) = self.collaborator.as_mut() {
            collaborator.set_container_height(height);
            let token = self.queue.begin(SequenceKind::Resize);
            self.queue.schedule(
                token,
                Deadline::Delay {
                    after: self.config.resize_settle(),
                    then_frames: 1,
                },
                Step::FitAndCenter,
            );
        }
        height
    }

    /// Advance one animation frame at time `now` and run the steps that
    /// became due.
    pub fn tick(&mut self, now: Duration) {
        for (token, step) in self.queue.advance(now) {
            // An earlier step in this batch may have superseded this one
            if !self.queue.is_live(token) {
                continue;
            }
            debug!(?step, kind = ?token.kind(), "running settle step");
            match step {
                Step::FitAndCenter => self.fit_and_center(),
                Step::FitZoom => self.fit_zoom(token),
                Step::FitMove => self.fit_move(),
                Step::CenterCropBox { scale } => {
                    self.center_crop_box(scale);
                }
            }
        }
    }

    fn fit_zoom(&mut self, token: SequenceToken) {
        let Some(collaborator) = self.collaborator.as_mut() else {
            return;
        };
        let (Some(container), Some(canvas)) =
            (collaborator.container_data(), collaborator.canvas_data())
        else {
            return;
        };

        let scale = geometry::fit_scale(&container, &canvas);
        let zoom = canvas.zoom() * scale;
        if !zoom.is_finite() || zoom <= 0.0 {
            return;
        }
        collaborator.zoom_to(zoom);
        self.queue.schedule(token, Deadline::Frames(1), Step::FitMove);
    }

    fn fit_move(&mut self) {
        let Some(collaborator) = self.collaborator.as_mut() else {
            return;
        };
        let (Some(container), Some(canvas)) =
            (collaborator.container_data(), collaborator.canvas_data())
        else {
            return;
        };
        let (left, top) = geometry::center_offset(&container, &canvas);
        collaborator.move_to(left, top);
    }
}

fn delay(after: Duration) -> Deadline {
    Deadline::Delay {
        after,
        then_frames: 0,
    }
}
