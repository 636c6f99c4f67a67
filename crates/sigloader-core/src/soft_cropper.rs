//! In-memory cropping collaborator.
//!
//! `SoftCropper` models the parts of Cropper.js behaviour the reconciler
//! depends on (view mode 1: the crop box may not leave the canvas) over a
//! decoded bitmap, so the whole capture pipeline runs without a browser.

use crate::config::CropperOptions;
use crate::decode::DecodedImage;
use crate::geometry::{self, CanvasData, ContainerData, Rect};
use crate::reconcile::Collaborator;
use crate::transform::{crop_region, rotate_quarter_turns, rotated_dimensions, QuarterTurn};

#[derive(Debug, Clone)]
pub struct SoftCropper {
    image: DecodedImage,
    rotation: f64,
    container: ContainerData,
    canvas: Rect,
    crop_box: Rect,
    aspect_ratio: Option<f64>,
    enabled: bool,
}

impl SoftCropper {
    /// Build a cropper with the canvas fitted and centered in `container`
    /// and an initial crop box covering `auto_crop_area` of the canvas.
    pub fn new(image: DecodedImage, container: ContainerData, options: &CropperOptions) -> Self {
        let natural = ContainerData {
            width: f64::from(image.width),
            height: f64::from(image.height),
        };
        let natural_canvas = CanvasData {
            width: natural.width,
            height: natural.height,
            natural_width: natural.width,
            natural_height: natural.height,
            ..Default::default()
        };
        let scale = geometry::fit_scale(&container, &natural_canvas);
        let width = natural.width * scale;
        let height = natural.height * scale;
        let canvas = Rect::new(
            (container.width - width) / 2.0,
            (container.height - height) / 2.0,
            width,
            height,
        );

        let aspect_ratio = (options.aspect_ratio > 0.0).then_some(options.aspect_ratio);
        let crop_box = match aspect_ratio {
            Some(ratio) => geometry::center_crop_box(&canvas, options.auto_crop_area, ratio),
            None => geometry::center_crop_box(&canvas, options.auto_crop_area, canvas.aspect_ratio()),
        };

        Self {
            image,
            rotation: 0.0,
            container,
            canvas,
            crop_box,
            aspect_ratio,
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current rotation in degrees, normalized to [0, 360).
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    fn natural_size(&self) -> (f64, f64) {
        let (w, h) = rotated_dimensions(self.image.width, self.image.height, self.rotation);
        (f64::from(w), f64::from(h))
    }

    /// Fit the crop box into the canvas, keeping the aspect ratio and
    /// shifting it inside when it pokes out.
    fn constrain_crop_box(&mut self, mut rect: Rect) -> Rect {
        let canvas = self.canvas;
        if let Some(ratio) = self.aspect_ratio {
            rect.height = rect.width / ratio;
            if rect.width > canvas.width {
                rect.width = canvas.width;
                rect.height = rect.width / ratio;
            }
            if rect.height > canvas.height {
                rect.height = canvas.height;
                rect.width = rect.height * ratio;
            }
        } else {
            rect.width = rect.width.min(canvas.width);
            rect.height = rect.height.min(canvas.height);
        }
        rect.left = clamp_span(rect.left, canvas.left, canvas.right() - rect.width);
        rect.top = clamp_span(rect.top, canvas.top, canvas.bottom() - rect.height);
        rect
    }

    fn reflow_crop_box(&mut self) {
        self.crop_box = self.constrain_crop_box(self.crop_box);
    }
}

impl Collaborator for SoftCropper {
    fn container_data(&self) -> Option<ContainerData> {
        Some(self.container)
    }

    fn set_container_height(&mut self, height: f64) {
        self.container.height = height;
    }

    fn canvas_data(&self) -> Option<CanvasData> {
        let (natural_width, natural_height) = self.natural_size();
        Some(CanvasData {
            left: self.canvas.left,
            top: self.canvas.top,
            width: self.canvas.width,
            height: self.canvas.height,
            natural_width,
            natural_height,
        })
    }

    fn set_canvas_data(&mut self, rect: Rect) {
        if !self.enabled || rect.width <= 0.0 {
            return;
        }
        let (natural_width, natural_height) = self.natural_size();
        self.canvas = Rect::new(
            rect.left,
            rect.top,
            rect.width,
            rect.width * natural_height / natural_width,
        );
        self.reflow_crop_box();
    }

    fn crop_box_data(&self) -> Option<Rect> {
        Some(self.crop_box)
    }

    fn set_crop_box_data(&mut self, rect: Rect) {
        if !self.enabled || rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        self.crop_box = self.constrain_crop_box(rect);
    }

    fn set_aspect_ratio(&mut self, ratio: f64) {
        if !self.enabled {
            return;
        }
        self.aspect_ratio = (ratio > 0.0).then_some(ratio);
        self.reflow_crop_box();
    }

    fn rotate(&mut self, degrees: f64) {
        self.rotate_to(self.rotation + degrees);
    }

    fn rotate_to(&mut self, degrees: f64) {
        if !self.enabled || !degrees.is_finite() {
            return;
        }
        let before = QuarterTurn::from_degrees(self.rotation);
        let after = QuarterTurn::from_degrees(degrees);
        self.rotation = degrees.rem_euclid(360.0);

        if before.swaps_dimensions() != after.swaps_dimensions() {
            let (cx, cy) = self.canvas.center();
            let (width, height) = (self.canvas.height, self.canvas.width);
            self.canvas = Rect::new(cx - width / 2.0, cy - height / 2.0, width, height);
        }
        self.reflow_crop_box();
    }

    fn zoom_to(&mut self, ratio: f64) {
        if !self.enabled || !ratio.is_finite() || ratio <= 0.0 {
            return;
        }
        let (natural_width, natural_height) = self.natural_size();
        let (cx, cy) = self.canvas.center();
        let width = natural_width * ratio;
        let height = natural_height * ratio;
        self.canvas = Rect::new(cx - width / 2.0, cy - height / 2.0, width, height);
        self.reflow_crop_box();
    }

    fn move_to(&mut self, left: f64, top: f64) {
        if !self.enabled {
            return;
        }
        let dx = left - self.canvas.left;
        let dy = top - self.canvas.top;
        self.canvas.left = left;
        self.canvas.top = top;
        // The crop box travels with the canvas it is pinned to
        self.crop_box.left += dx;
        self.crop_box.top += dy;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn cropped_image(&self) -> Option<DecodedImage> {
        if self.canvas.width <= 0.0 || self.image.is_empty() {
            return None;
        }
        let (natural_width, _) = self.natural_size();
        let scale = natural_width / self.canvas.width;

        let x = ((self.crop_box.left - self.canvas.left) * scale).round().max(0.0);
        let y = ((self.crop_box.top - self.canvas.top) * scale).round().max(0.0);
        let width = (self.crop_box.width * scale).round().max(1.0);
        let height = (self.crop_box.height * scale).round().max(1.0);

        let rotated = rotate_quarter_turns(&self.image, self.rotation);
        Some(crop_region(
            &rotated,
            x as u32,
            y as u32,
            width as u32,
            height as u32,
        ))
    }
}

/// Like `f64::clamp`, but tolerates `max < min` from rounding (min wins).
fn clamp_span(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}
