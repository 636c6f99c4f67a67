//! Layout arithmetic shared by the reconciler and the cropper backends.
//!
//! All rectangles are in CSS pixels relative to the cropper container, the
//! same space the cropping collaborator reports its canvas and crop box in.

use serde::{Deserialize, Serialize};

/// Width:height ratio of the signature slot in the generated documents.
pub const TARGET_ASPECT_RATIO: f64 = 945.0 / 535.0;

/// Tolerance for floating-point layout comparisons.
pub const LAYOUT_EPSILON: f64 = 1e-6;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Whether `other` lies inside `self`, allowing for rounding noise.
    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left - LAYOUT_EPSILON
            && other.top >= self.top - LAYOUT_EPSILON
            && other.right() <= self.right() + LAYOUT_EPSILON
            && other.bottom() <= self.bottom() + LAYOUT_EPSILON
    }
}

/// Size of the visible cropping container (the viewport).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerData {
    pub width: f64,
    pub height: f64,
}

/// On-screen rectangle of the transformed bitmap plus its natural size.
///
/// `natural_width`/`natural_height` describe the rotated bitmap, so after a
/// quarter turn they are swapped relative to the source file.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasData {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub natural_width: f64,
    pub natural_height: f64,
}

impl CanvasData {
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    /// Current zoom ratio (on-screen pixels per natural pixel).
    pub fn zoom(&self) -> f64 {
        self.width / self.natural_width
    }
}

/// Largest uniform scale that fits the canvas inside the container.
pub fn fit_scale(container: &ContainerData, canvas: &CanvasData) -> f64 {
    let scale_x = container.width / canvas.width;
    let scale_y = container.height / canvas.height;
    scale_x.min(scale_y)
}

/// Offset that centers a canvas of the given size in the container.
pub fn center_offset(container: &ContainerData, canvas: &CanvasData) -> (f64, f64) {
    (
        (container.width - canvas.width) / 2.0,
        (container.height - canvas.height) / 2.0,
    )
}

/// Crop box of the given aspect ratio that fits in `scale × canvas`,
/// centered on the canvas center.
///
/// The box starts at full scaled width and shrinks to the height limit when
/// the canvas is too short for it.
pub fn center_crop_box(canvas: &Rect, scale: f64, ratio: f64) -> Rect {
    let max_width = canvas.width * scale;
    let max_height = canvas.height * scale;

    let mut width = max_width;
    let mut height = width / ratio;
    if height > max_height {
        height = max_height;
        width = height * ratio;
    }

    let (center_x, center_y) = canvas.center();
    Rect::new(center_x - width / 2.0, center_y - height / 2.0, width, height)
}

/// Viewport height left over once the control panel and margin are taken.
pub fn viewport_height(window_height: f64, controls_height: f64, margin: f64, min: f64) -> f64 {
    (window_height - controls_height - margin).max(min)
}

/// Advance a rotation by `delta` degrees, normalized into [0, 360).
pub fn normalize_rotation(current: i32, delta: i32) -> i32 {
    (current + delta).rem_euclid(360)
}

/// Zoom ratios a user gesture may reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.5, max: 3.0 }
    }
}

impl ZoomLimits {
    pub fn allows(&self, ratio: f64) -> bool {
        ratio >= self.min && ratio <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(width: f64, height: f64) -> CanvasData {
        CanvasData {
            left: 0.0,
            top: 0.0,
            width,
            height,
            natural_width: width * 2.0,
            natural_height: height * 2.0,
        }
    }

    fn assert_centered(inner: &Rect, outer: &Rect) {
        let (ix, iy) = inner.center();
        let (ox, oy) = outer.center();
        assert!((ix - ox).abs() < LAYOUT_EPSILON && (iy - oy).abs() < LAYOUT_EPSILON);
    }

    #[test]
    fn test_fit_scale_picks_limiting_axis() {
        let container = ContainerData {
            width: 800.0,
            height: 400.0,
        };
        assert_eq!(fit_scale(&container, &canvas(1600.0, 400.0)), 0.5);
        assert_eq!(fit_scale(&container, &canvas(400.0, 800.0)), 0.5);
        assert_eq!(fit_scale(&container, &canvas(200.0, 100.0)), 4.0);
    }

    #[test]
    fn test_center_offset() {
        let container = ContainerData {
            width: 800.0,
            height: 400.0,
        };
        assert_eq!(center_offset(&container, &canvas(600.0, 400.0)), (100.0, 0.0));
    }

    #[test]
    fn test_canvas_zoom() {
        assert_eq!(canvas(300.0, 100.0).zoom(), 0.5);
    }

    #[test]
    fn test_center_crop_box_wide_canvas() {
        // Wide canvas: height is the limiting axis
        let rect = Rect::new(0.0, 0.0, 2000.0, 500.0);
        let crop = center_crop_box(&rect, 0.6, TARGET_ASPECT_RATIO);

        assert!((crop.height - 300.0).abs() < LAYOUT_EPSILON);
        assert!((crop.aspect_ratio() - TARGET_ASPECT_RATIO).abs() < LAYOUT_EPSILON);
        assert_centered(&crop, &rect);
    }

    #[test]
    fn test_center_crop_box_tall_canvas() {
        // Tall canvas: width is the limiting axis
        let rect = Rect::new(10.0, 20.0, 400.0, 900.0);
        let crop = center_crop_box(&rect, 0.5, TARGET_ASPECT_RATIO);

        assert!((crop.width - 200.0).abs() < LAYOUT_EPSILON);
        assert!((crop.height - 200.0 / TARGET_ASPECT_RATIO).abs() < LAYOUT_EPSILON);
        assert_centered(&crop, &rect);
    }

    #[test]
    fn test_center_crop_box_idempotent() {
        let rect = Rect::new(3.0, 4.0, 640.0, 480.0);
        let a = center_crop_box(&rect, 0.6, TARGET_ASPECT_RATIO);
        let b = center_crop_box(&rect, 0.6, TARGET_ASPECT_RATIO);
        assert_eq!(a, b);
    }

    #[test]
    fn test_viewport_height() {
        assert_eq!(viewport_height(1000.0, 400.0, 24.0, 120.0), 576.0);
        assert_eq!(viewport_height(500.0, 400.0, 24.0, 120.0), 120.0);
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(0, 90), 90);
        assert_eq!(normalize_rotation(270, 90), 0);
        assert_eq!(normalize_rotation(0, -90), 270);
        assert_eq!(normalize_rotation(90, -450), 0);
    }

    #[test]
    fn test_zoom_limits() {
        let limits = ZoomLimits::default();
        assert!(limits.allows(1.0));
        assert!(limits.allows(0.5));
        assert!(limits.allows(3.0));
        assert!(!limits.allows(0.49));
        assert!(!limits.allows(3.01));
    }

    #[test]
    fn test_canvas_data_serde_camel_case() {
        let json = serde_json::to_value(canvas(10.0, 5.0)).unwrap();
        assert_eq!(json["naturalWidth"], 20.0);
        assert_eq!(json["naturalHeight"], 10.0);
    }

    #[test]
    fn test_rect_contains() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains(&Rect::new(10.0, 10.0, 80.0, 80.0)));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&Rect::new(50.0, 50.0, 60.0, 10.0)));
    }
}
