//! Cropper.js as a reconciler collaborator.
//!
//! The page must load Cropper.js (and its stylesheet) so that a global
//! `Cropper` constructor exists before a widget loads an image.

use std::cell::Cell;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use sigloader_core::config::CropperOptions;
use sigloader_core::decode::DecodedImage;
use sigloader_core::geometry::{CanvasData, ContainerData, Rect, ZoomLimits};
use sigloader_core::reconcile::Collaborator;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, CustomEvent, HtmlCanvasElement, HtmlElement, HtmlImageElement};

use crate::types::js_error;

#[wasm_bindgen]
extern "C" {
    type Cropper;

    #[wasm_bindgen(constructor, catch)]
    fn new(element: &HtmlImageElement, options: &JsValue) -> Result<Cropper, JsValue>;

    #[wasm_bindgen(method, js_name = getContainerData)]
    fn get_container_data(this: &Cropper) -> JsValue;

    #[wasm_bindgen(method, js_name = getCanvasData)]
    fn get_canvas_data(this: &Cropper) -> JsValue;

    #[wasm_bindgen(method, js_name = setCanvasData)]
    fn set_canvas_data(this: &Cropper, data: &JsValue);

    #[wasm_bindgen(method, js_name = getCropBoxData)]
    fn get_crop_box_data(this: &Cropper) -> JsValue;

    #[wasm_bindgen(method, js_name = setCropBoxData)]
    fn set_crop_box_data(this: &Cropper, data: &JsValue);

    #[wasm_bindgen(method, js_name = setAspectRatio)]
    fn set_aspect_ratio(this: &Cropper, ratio: f64);

    #[wasm_bindgen(method)]
    fn rotate(this: &Cropper, degrees: f64);

    #[wasm_bindgen(method, js_name = rotateTo)]
    fn rotate_to(this: &Cropper, degrees: f64);

    #[wasm_bindgen(method, js_name = zoomTo)]
    fn zoom_to(this: &Cropper, ratio: f64);

    #[wasm_bindgen(method, js_name = moveTo)]
    fn move_to(this: &Cropper, x: f64, y: f64);

    #[wasm_bindgen(method)]
    fn enable(this: &Cropper);

    #[wasm_bindgen(method)]
    fn disable(this: &Cropper);

    #[wasm_bindgen(method)]
    fn destroy(this: &Cropper);

    #[wasm_bindgen(method, js_name = getCroppedCanvas)]
    fn get_cropped_canvas(this: &Cropper) -> Option<HtmlCanvasElement>;
}

/// Images inside the cropper that show the live filter preview.
const PREVIEW_IMAGES: &str = ".cropper-canvas img, .cropper-view-box img";

/// A Cropper.js instance bound to one loaded image.
pub struct JsCropper {
    cropper: Cropper,
    container: HtmlElement,
    programmatic_zoom: Rc<Cell<bool>>,
    _on_ready: Closure<dyn FnMut()>,
    _on_zoom: Closure<dyn FnMut(CustomEvent)>,
}

impl JsCropper {
    /// Construct Cropper.js on `image`, sized by `container`.
    ///
    /// `on_ready` fires once Cropper.js has built its DOM. User zoom
    /// gestures outside `zoom_limits` are cancelled; zooms issued through
    /// [`Collaborator::zoom_to`] are not.
    pub fn new(
        image: &HtmlImageElement,
        container: HtmlElement,
        options: &CropperOptions,
        zoom_limits: ZoomLimits,
        on_ready: impl FnMut() + 'static,
    ) -> Result<Self, JsValue> {
        let programmatic_zoom = Rc::new(Cell::new(false));

        let on_ready = Closure::<dyn FnMut()>::new(on_ready);
        let flag = programmatic_zoom.clone();
        let on_zoom = Closure::<dyn FnMut(CustomEvent)>::new(move |event: CustomEvent| {
            if flag.get() {
                return;
            }
            let ratio = js_sys::Reflect::get(&event.detail(), &JsValue::from_str("ratio"))
                .ok()
                .and_then(|ratio| ratio.as_f64());
            if let Some(ratio) = ratio {
                if !zoom_limits.allows(ratio) {
                    event.prevent_default();
                }
            }
        });

        let js_options = serde_wasm_bindgen::to_value(options).map_err(js_error)?;
        js_sys::Reflect::set(&js_options, &JsValue::from_str("ready"), on_ready.as_ref())?;
        js_sys::Reflect::set(&js_options, &JsValue::from_str("zoom"), on_zoom.as_ref())?;

        let cropper = Cropper::new(image, &js_options)?;
        Ok(Self {
            cropper,
            container,
            programmatic_zoom,
            _on_ready: on_ready,
            _on_zoom: on_zoom,
        })
    }

    /// Apply a CSS filter to the preview images.
    pub fn set_preview_filter(&self, css: &str) {
        let images = match self.container.query_selector_all(PREVIEW_IMAGES) {
            Ok(images) => images,
            Err(e) => {
                log::warn!("preview lookup failed: {e:?}");
                return;
            }
        };
        for index in 0..images.length() {
            let Some(image) = images
                .item(index)
                .and_then(|node| node.dyn_into::<HtmlElement>().ok())
            else {
                continue;
            };
            if let Err(e) = image.style().set_property("filter", css) {
                log::warn!("failed to set preview filter: {e:?}");
            }
        }
    }

    fn set_zoom_programmatically(&self, ratio: f64) {
        self.programmatic_zoom.set(true);
        self.cropper.zoom_to(ratio);
        self.programmatic_zoom.set(false);
    }
}

/// Cropper.js returns `{}` until it is ready; that reads as `None`.
fn read<T: DeserializeOwned>(value: JsValue) -> Option<T> {
    serde_wasm_bindgen::from_value(value).ok()
}

fn write(rect: &Rect) -> Option<JsValue> {
    serde_wasm_bindgen::to_value(rect).ok()
}

impl Collaborator for JsCropper {
    fn container_data(&self) -> Option<ContainerData> {
        read(self.cropper.get_container_data())
    }

    fn set_container_height(&mut self, height: f64) {
        if let Err(e) = self
            .container
            .style()
            .set_property("height", &format!("{height}px"))
        {
            log::warn!("failed to resize cropper container: {e:?}");
        }
    }

    fn canvas_data(&self) -> Option<CanvasData> {
        read(self.cropper.get_canvas_data())
    }

    fn set_canvas_data(&mut self, rect: Rect) {
        if let Some(data) = write(&rect) {
            self.cropper.set_canvas_data(&data);
        }
    }

    fn crop_box_data(&self) -> Option<Rect> {
        read(self.cropper.get_crop_box_data())
    }

    fn set_crop_box_data(&mut self, rect: Rect) {
        if let Some(data) = write(&rect) {
            self.cropper.set_crop_box_data(&data);
        }
    }

    fn set_aspect_ratio(&mut self, ratio: f64) {
        self.cropper.set_aspect_ratio(ratio);
    }

    fn rotate(&mut self, degrees: f64) {
        self.cropper.rotate(degrees);
    }

    fn rotate_to(&mut self, degrees: f64) {
        self.cropper.rotate_to(degrees);
    }

    fn zoom_to(&mut self, ratio: f64) {
        self.set_zoom_programmatically(ratio);
    }

    fn move_to(&mut self, left: f64, top: f64) {
        self.cropper.move_to(left, top);
    }

    fn enable(&mut self) {
        self.cropper.enable();
    }

    fn disable(&mut self) {
        self.cropper.disable();
    }

    fn cropped_image(&self) -> Option<DecodedImage> {
        let canvas = self.cropper.get_cropped_canvas()?;
        let (width, height) = (canvas.width(), canvas.height());
        if width == 0 || height == 0 {
            return Some(DecodedImage::new(width, height, Vec::new()));
        }

        let context = canvas
            .get_context("2d")
            .ok()??
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        let data = context
            .get_image_data(0.0, 0.0, f64::from(width), f64::from(height))
            .ok()?;
        Some(DecodedImage::new(width, height, data.data().0))
    }

    fn destroy(&mut self) {
        self.cropper.destroy();
    }
}
