//! Browser plumbing: window measurements, canvases, the section observer,
//! resize handling and the animation-frame driver.
//!
//! Every listener owns its closure and unregisters itself on drop, so
//! `stop_backdrop` tears everything down by dropping these values.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use foundation::color::{Rgb, parse_rgb_triple};
use foundation::viewport::{BackingStore, Viewport};
use scene::ScrollSample;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlCanvasElement, HtmlElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, Window,
};

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

pub fn read_viewport(win: &Window) -> Result<Viewport, JsValue> {
    let width = win.inner_width()?.as_f64().unwrap_or(0.0);
    let height = win.inner_height()?.as_f64().unwrap_or(0.0);
    Ok(Viewport::new(width, height, win.device_pixel_ratio()))
}

/// Scroll position and document extent, in CSS pixels.
pub fn read_scroll(win: &Window) -> Result<ScrollSample, JsValue> {
    let offset = win.scroll_y()?;
    let scroll_height = win
        .document()
        .and_then(|d| d.body())
        .map(|b| b.scroll_height() as f64)
        .unwrap_or(0.0);
    let viewport_height = win.inner_height()?.as_f64().unwrap_or(0.0);
    Ok(ScrollSample::new(offset, scroll_height, viewport_height))
}

pub fn canvas_by_id(doc: &Document, id: &str) -> Result<HtmlCanvasElement, JsValue> {
    doc.get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("canvas #{id} not found")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not a canvas")))
}

pub fn apply_backing_store(canvas: &HtmlCanvasElement, store: BackingStore) {
    canvas.set_width(store.width);
    canvas.set_height(store.height);
}

pub fn hide(canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let el: &HtmlElement = canvas.as_ref();
    el.style().set_property("display", "none")
}

pub fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

pub fn error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

pub fn alert(msg: &str) {
    if let Some(win) = web_sys::window() {
        let _ = win.alert_with_message(msg);
    }
}

type ObserverCallback = dyn FnMut(js_sys::Array, IntersectionObserver);

/// Watches colored sections and reports the color of whichever one
/// crosses the middle of the viewport.
pub struct SectionObserver {
    observer: IntersectionObserver,
    _callback: Closure<ObserverCallback>,
}

impl SectionObserver {
    pub fn observe<F>(
        doc: &Document,
        selector: &str,
        attribute: &str,
        root_margin: &str,
        mut on_color: F,
    ) -> Result<Self, JsValue>
    where
        F: FnMut(Rgb) + 'static,
    {
        let attribute = attribute.to_string();
        let handler = move |entries: js_sys::Array, _observer: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if !entry.is_intersecting() {
                    continue;
                }
                let Some(raw) = entry.target().get_attribute(&attribute) else {
                    continue;
                };
                match parse_rgb_triple(&raw) {
                    Ok(color) => on_color(color),
                    Err(e) => error(&format!("ignoring {attribute}=\"{raw}\": {e}")),
                }
            }
        };
        let callback = Closure::wrap(Box::new(handler) as Box<ObserverCallback>);

        let init = IntersectionObserverInit::new();
        init.set_root_margin(root_margin);
        init.set_threshold(&JsValue::from_f64(0.0));
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;

        let sections = doc.query_selector_all(selector)?;
        for i in 0..sections.length() {
            if let Some(el) = sections.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                observer.observe(&el);
            }
        }
        if sections.length() == 0 {
            log(&format!("no sections match {selector}; color stays fixed"));
        }

        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for SectionObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// `resize` listener on the window.
pub struct ResizeListener {
    window: Window,
    callback: Closure<dyn FnMut()>,
}

impl ResizeListener {
    pub fn attach<F>(window: &Window, on_resize: F) -> Result<Self, JsValue>
    where
        F: FnMut() + 'static,
    {
        let callback = Closure::wrap(Box::new(on_resize) as Box<dyn FnMut()>);
        window.add_event_listener_with_callback("resize", callback.as_ref().unchecked_ref())?;
        Ok(Self {
            window: window.clone(),
            callback,
        })
    }
}

impl Drop for ResizeListener {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.callback.as_ref().unchecked_ref());
    }
}

/// A single reusable `setTimeout`; rescheduling clears the pending one.
pub struct Timer {
    window: Window,
    handle: Cell<Option<i32>>,
    callback: Closure<dyn FnMut()>,
}

impl Timer {
    pub fn new<F>(window: &Window, on_fire: F) -> Self
    where
        F: FnMut() + 'static,
    {
        Self {
            window: window.clone(),
            handle: Cell::new(None),
            callback: Closure::wrap(Box::new(on_fire) as Box<dyn FnMut()>),
        }
    }

    pub fn schedule(&self, delay_ms: f64) -> Result<(), JsValue> {
        self.clear();
        let handle = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                self.callback.as_ref().unchecked_ref(),
                delay_ms.ceil() as i32,
            )?;
        self.handle.set(Some(handle));
        Ok(())
    }

    pub fn clear(&self) {
        if let Some(handle) = self.handle.take() {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.clear();
    }
}

type FrameClosure = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Self-rescheduling `requestAnimationFrame` loop.
///
/// The tick returns whether to keep going. The closure holds a clone of its
/// own slot, so [`AnimationDriver::cancel`] must empty the slot to break
/// the cycle.
pub struct AnimationDriver {
    slot: FrameClosure,
    handle: Rc<Cell<Option<i32>>>,
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
            handle: Rc::new(Cell::new(None)),
        }
    }

    pub fn start<F>(&self, mut tick: F) -> Result<(), JsValue>
    where
        F: FnMut(f64) -> bool + 'static,
    {
        self.cancel();

        let slot = self.slot.clone();
        let handle = self.handle.clone();
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            handle.set(None);
            if !tick(timestamp_ms) {
                slot.borrow_mut().take();
                return;
            }
            let next = slot
                .borrow()
                .as_ref()
                .map(|f| request_frame(f.as_ref().unchecked_ref()));
            match next {
                Some(Ok(id)) => handle.set(Some(id)),
                Some(Err(e)) => error(&format!("requestAnimationFrame failed: {e:?}")),
                None => {}
            }
        }) as Box<dyn FnMut(f64)>);

        let id = request_frame(closure.as_ref().unchecked_ref())?;
        self.handle.set(Some(id));
        *self.slot.borrow_mut() = Some(closure);
        Ok(())
    }

    pub fn cancel(&self) {
        if let Some(id) = self.handle.take() {
            if let Some(win) = web_sys::window() {
                let _ = win.cancel_animation_frame(id);
            }
        }
        self.slot.borrow_mut().take();
    }
}

impl Drop for AnimationDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn request_frame(f: &js_sys::Function) -> Result<i32, JsValue> {
    window()?.request_animation_frame(f)
}
