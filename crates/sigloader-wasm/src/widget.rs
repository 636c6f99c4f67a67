//! The signature widget as seen from the page.
//!
//! `SignatureWidget` owns the session and wires it to the browser: it runs
//! a `requestAnimationFrame` pump while reconciler steps are pending,
//! performs the upload and clipboard writes on the event loop, and reports
//! a state snapshot to the page after every change.
//!
//! # Example
//!
//! ```typescript
//! const widget = new SignatureWidget({ minOutputSize: 10 });
//! widget.on_change((state) => render(state));
//! image.onload = () => widget.load(image, container);
//! window.addEventListener('resize', () => widget.resize());
//! rotateRight.onclick = () => widget.rotate_right();
//! cropButton.onclick = () => widget.crop();
//! uploadButton.onclick = () => widget.upload();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use sigloader_core::session::{CropOutcome, SignatureSession};
use sigloader_core::upload::Uploader;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{HtmlElement, HtmlImageElement};

use crate::cropper::JsCropper;
use crate::types::{config_from_js, js_error, state_to_js};

type Session = SignatureSession<JsCropper>;

struct Inner {
    session: RefCell<Session>,
    uploader: Uploader,
    on_change: RefCell<Option<js_sys::Function>>,
    frame: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    frame_requested: Cell<bool>,
}

impl Inner {
    /// Run `f` against the session, then publish the new state and keep
    /// the frame pump going if anything is pending.
    fn update<R>(self: &Rc<Self>, f: impl FnOnce(&mut Session) -> R) -> R {
        let (result, pending) = {
            let mut session = self.session.borrow_mut();
            session.sync_clock(now());
            let result = f(&mut session);
            (result, session.has_pending())
        };
        self.notify();
        if pending {
            self.request_frame();
        }
        result
    }

    fn notify(&self) {
        let Some(callback) = self.on_change.borrow().clone() else {
            return;
        };
        let state = self.session.borrow().state();
        match state_to_js(&state) {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    log::warn!("state callback threw: {e:?}");
                }
            }
            Err(e) => log::warn!("failed to convert state: {e:?}"),
        }
    }

    fn request_frame(self: &Rc<Self>) {
        if self.frame_requested.get() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };

        let mut frame = self.frame.borrow_mut();
        let callback = frame.get_or_insert_with(|| {
            let inner = Rc::downgrade(self);
            Closure::new(move |timestamp: f64| {
                if let Some(inner) = inner.upgrade() {
                    inner.on_frame(timestamp);
                }
            })
        });
        match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            Ok(_) => self.frame_requested.set(true),
            Err(e) => log::warn!("requestAnimationFrame failed: {e:?}"),
        }
    }

    fn on_frame(self: &Rc<Self>, timestamp: f64) {
        self.frame_requested.set(false);
        let pending = {
            let mut session = self.session.borrow_mut();
            session.tick(millis(timestamp));
            session.has_pending()
        };
        self.notify();
        if pending {
            self.request_frame();
        }
    }

    fn preview_filter(&self, css: &str) {
        if let Some(cropper) = self.session.borrow().reconciler().collaborator() {
            cropper.set_preview_filter(css);
        }
    }
}

fn millis(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0) / 1000.0)
}

/// Same time base as animation frame timestamps.
fn now() -> Duration {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| millis(performance.now()))
        .unwrap_or_default()
}

fn window_height() -> f64 {
    web_sys::window()
        .and_then(|window| window.inner_height().ok())
        .and_then(|height| height.as_f64())
        .unwrap_or_default()
}

async fn write_clipboard(text: &str) -> Result<(), String> {
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let promise = window.navigator().clipboard().write_text(text);
    JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|e| e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

/// Signature capture widget.
#[wasm_bindgen]
pub struct SignatureWidget {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl SignatureWidget {
    /// Create a widget. `config` may be `undefined` or a partial
    /// configuration object; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SignatureWidget, JsValue> {
        let config = config_from_js(config)?;
        let uploader = Uploader::new(&config.upload).map_err(js_error)?;
        Ok(Self {
            inner: Rc::new(Inner {
                session: RefCell::new(SignatureSession::new(config)),
                uploader,
                on_change: RefCell::new(None),
                frame: RefCell::new(None),
                frame_requested: Cell::new(false),
            }),
        })
    }

    /// Register a callback receiving a state snapshot after every change.
    pub fn on_change(&self, callback: js_sys::Function) {
        *self.inner.on_change.borrow_mut() = Some(callback);
        self.inner.notify();
    }

    /// Current state snapshot.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        state_to_js(&self.inner.session.borrow().state())
    }

    #[wasm_bindgen(getter)]
    pub fn status(&self) -> String {
        self.inner.session.borrow().status().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn link(&self) -> Option<String> {
        self.inner.session.borrow().link().map(str::to_string)
    }

    /// The PNG produced by the last successful crop.
    pub fn cropped_png(&self) -> Option<Vec<u8>> {
        self.inner.session.borrow().cropped_png().map(<[u8]>::to_vec)
    }

    /// Start editing `image` inside `container`, replacing any previous
    /// image.
    pub fn load(&self, image: HtmlImageElement, container: HtmlElement) -> Result<(), JsValue> {
        // Cropper.js refuses to bind an element that still has an instance
        self.inner.update(Session::unload);

        let height = self.inner.update(|session| session.resize(window_height()));
        container
            .style()
            .set_property("height", &format!("{height}px"))?;

        let (options, zoom_limits) = {
            let session = self.inner.session.borrow();
            (session.config().cropper_options(), session.config().zoom_limits)
        };
        let inner = Rc::downgrade(&self.inner);
        let cropper = JsCropper::new(&image, container, &options, zoom_limits, move || {
            if let Some(inner) = inner.upgrade() {
                inner.update(Session::on_ready);
            }
        })?;

        self.inner.update(|session| session.load_image(cropper));
        log::info!("cropper created");
        Ok(())
    }

    /// Window resized; returns the new container height in pixels.
    pub fn resize(&self) -> f64 {
        self.inner.update(|session| session.resize(window_height()))
    }

    pub fn rotate_left(&self) {
        self.inner.update(Session::rotate_left);
    }

    pub fn rotate_right(&self) {
        self.inner.update(Session::rotate_right);
    }

    /// Returns the CSS filter now shown on the preview.
    pub fn set_brightness(&self, value: f32) -> String {
        let css = self.inner.update(|session| session.set_brightness(value));
        self.inner.preview_filter(&css);
        css
    }

    /// Returns the CSS filter now shown on the preview.
    pub fn set_contrast(&self, value: f32) -> String {
        let css = self.inner.update(|session| session.set_contrast(value));
        self.inner.preview_filter(&css);
        css
    }

    /// Produce the filtered PNG. Returns whether it is ready for upload.
    pub fn crop(&self) -> bool {
        matches!(
            self.inner.update(Session::crop),
            CropOutcome::Ready { .. }
        )
    }

    /// Upload the cropped PNG and copy the resulting link. Completion is
    /// reported through the state callback.
    pub fn upload(&self) {
        let Some(pending) = self.inner.update(Session::begin_upload) else {
            return;
        };
        let ticket = pending.ticket;
        let inner = self.inner.clone();
        spawn_local(async move {
            let result = inner.uploader.upload(pending.png).await;
            if let Some(link) = inner.update(|session| session.finish_upload(ticket, result)) {
                let copied = write_clipboard(&link).await;
                inner.update(|session| session.upload_link_copied(ticket, copied));
            }
        });
    }

    /// Copy the uploaded link again.
    pub fn copy_link(&self) {
        let Some(link) = self.inner.session.borrow().copy_link() else {
            return;
        };
        let inner = self.inner.clone();
        spawn_local(async move {
            let copied = write_clipboard(&link).await;
            inner.update(|session| session.link_copied(copied));
        });
    }

    /// Open the provider form in a new tab.
    pub fn open_form(&self) -> Result<(), JsValue> {
        let url = self.inner.session.borrow().config().open_form_url.clone();
        let window = web_sys::window().ok_or_else(|| js_error("no window"))?;
        window.open_with_url_and_target(&url, "_blank")?;
        Ok(())
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    // Stand-in for Cropper.js that keeps its element binding rules: the
    // constructor bails out on an element that already has an instance and
    // destroy clears whatever instance the element holds.
    #[wasm_bindgen(inline_js = r#"
        export function install_stub_cropper() {
            globalThis.Cropper = class {
                constructor(element, options) {
                    this.element = element;
                    this.initialized = false;
                    if (element.cropper) {
                        return;
                    }
                    element.cropper = this;
                    this.initialized = true;
                }
                getContainerData() { return {}; }
                getCanvasData() { return {}; }
                setCanvasData() {}
                getCropBoxData() { return {}; }
                setCropBoxData() {}
                setAspectRatio() {}
                rotate() {}
                rotateTo() {}
                zoomTo() {}
                moveTo() {}
                enable() {}
                disable() {}
                destroy() {
                    if (this.element.cropper) {
                        delete this.element.cropper;
                    }
                }
                getCroppedCanvas() { return null; }
            };
        }

        export function bound_cropper_initialized(element) {
            return Boolean(element.cropper && element.cropper.initialized);
        }
    "#)]
    extern "C" {
        fn install_stub_cropper();
        fn bound_cropper_initialized(element: &HtmlImageElement) -> bool;
    }

    fn element<T: JsCast>(tag: &str) -> T {
        web_sys::window()
            .unwrap()
            .document()
            .unwrap()
            .create_element(tag)
            .unwrap()
            .dyn_into::<T>()
            .unwrap()
    }

    #[wasm_bindgen_test]
    fn test_reload_same_image_rebinds_cropper() {
        install_stub_cropper();
        let widget = SignatureWidget::new(JsValue::UNDEFINED).unwrap();
        let image: HtmlImageElement = element("img");
        let container: HtmlElement = element("div");

        widget.load(image.clone(), container.clone()).unwrap();
        assert!(bound_cropper_initialized(&image));

        widget.load(image.clone(), container).unwrap();
        assert!(bound_cropper_initialized(&image));
        assert!(widget.inner.session.borrow().controls().editor_visible);
    }

    #[wasm_bindgen_test]
    fn test_new_widget_is_idle() {
        let widget = SignatureWidget::new(JsValue::UNDEFINED).unwrap();
        assert_eq!(widget.status(), "");
        assert!(widget.link().is_none());
        assert!(widget.cropped_png().is_none());
        assert!(!widget.crop());
    }

    #[wasm_bindgen_test]
    fn test_partial_config() {
        let config = js_sys::Object::new();
        js_sys::Reflect::set(&config, &"minOutputSize".into(), &JsValue::from(20)).unwrap();
        let widget = SignatureWidget::new(config.into()).unwrap();
        let session = widget.inner.session.borrow();
        assert_eq!(session.config().min_output_size, 20);
        assert_eq!(session.config().upload.field_name, "files[]");
    }

    #[wasm_bindgen_test]
    fn test_filters_without_image() {
        let widget = SignatureWidget::new(JsValue::UNDEFINED).unwrap();
        assert_eq!(widget.set_brightness(1.5), "brightness(1.5) contrast(1)");
        assert_eq!(widget.set_contrast(0.8), "brightness(1.5) contrast(0.8)");
    }

    #[wasm_bindgen_test]
    fn test_upload_without_crop_is_noop() {
        let widget = SignatureWidget::new(JsValue::UNDEFINED).unwrap();
        widget.upload();
        assert_eq!(widget.status(), "");
    }

    #[wasm_bindgen_test]
    fn test_resize_without_image_reports_height() {
        let widget = SignatureWidget::new(JsValue::UNDEFINED).unwrap();
        assert!(widget.resize() >= 120.0);
    }
}
