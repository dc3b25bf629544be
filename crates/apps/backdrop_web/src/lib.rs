use console_error_panic_hook::set_once;
use std::cell::{Cell, RefCell};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use foundation::color::Rgb;
use gpu::{PassKind, PassSet, Renderer, ResourceState, TargetSizes};
use runtime::{Debouncer, EventKind, Frame, FrameHandler, FrameOutcome, FrameStats, RenderLoop};
use scene::{Backdrop, ScrollSample};
use serde::Serialize;

pub mod assets;
pub mod canvas2d;
pub mod config;
pub mod dom;
mod wgpu;

use assets::{AssetError, DecodedTexture, fetch_blue_noise};
use canvas2d::StarLayer;
use config::BackdropConfig;
use dom::{AnimationDriver, ResizeListener, SectionObserver, Timer};
use wgpu::GpuBackdrop;

/// Everything one `start_backdrop` call owns. Dropping it unhooks every
/// listener and cancels the pending animation frame.
struct App {
    session: u64,
    config: BackdropConfig,
    window: web_sys::Window,
    bg_canvas: web_sys::HtmlCanvasElement,
    backdrop: Backdrop,
    rng: fastrand::Rng,
    stars: StarLayer,
    gpu: Option<GpuBackdrop>,
    resources: ResourceState,
    render_loop: RenderLoop,
    debounce: Debouncer,
    resize_timer: Timer,
    _resize: ResizeListener,
    _observer: Option<SectionObserver>,
    driver: AnimationDriver,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    static SESSION: Cell<u64> = const { Cell::new(0) };
}

/// Runs `f` against the live app, if any.
fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Like [`with_app`], but only for the app started in `session`; results of
/// async work that outlived a restart are discarded.
fn with_session<R>(session: u64, f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|cell| match cell.borrow_mut().as_mut() {
        Some(app) if app.session == session => Some(f(app)),
        _ => None,
    })
}

/// One frame: advance the scene, draw the GPU passes, then the stars.
struct Stage<'a> {
    backdrop: &'a mut Backdrop,
    stars: &'a StarLayer,
    gpu: Option<&'a mut GpuBackdrop>,
    resources: ResourceState,
    scroll: ScrollSample,
    star_color: &'a str,
}

impl FrameHandler for Stage<'_> {
    fn on_frame(&mut self, frame: Frame) -> FrameOutcome {
        let update = self.backdrop.advance(&frame, self.scroll);
        if !update.redraw {
            return FrameOutcome::Skipped;
        }

        let mut availability = Renderer::availability(self.backdrop, self.resources);
        if let Some(gpu) = self.gpu.as_deref_mut() {
            gpu.sync_geometry(self.backdrop);
            availability.disabled = gpu.disabled();
        }
        let prepared = Renderer::prepare(self.backdrop, &frame, availability);

        if let Some(gpu) = self.gpu.as_deref_mut() {
            if let Err(err) = gpu.render(&prepared) {
                dom::error(&format!("frame {}: {:?}", frame.index, err));
            }
        }

        if prepared.plan.runs(PassKind::Stars) {
            if let Err(err) = self.stars.draw(
                self.backdrop.stars(),
                self.scroll.offset,
                self.backdrop.store(),
                self.backdrop.pixel_scale(),
                self.star_color,
            ) {
                dom::error(&format!("star layer: {:?}", err));
            }
        }
        FrameOutcome::Rendered
    }
}

impl App {
    fn frame(&mut self, timestamp_ms: f64) -> bool {
        let scroll = dom::read_scroll(&self.window).unwrap_or_else(|_| self.backdrop.scroll());
        let mut stage = Stage {
            backdrop: &mut self.backdrop,
            stars: &self.stars,
            gpu: self.gpu.as_mut(),
            resources: self.resources,
            scroll,
            star_color: &self.config.scene.stars.color,
        };
        self.render_loop.step(timestamp_ms, &mut stage);
        if self.config.trace_events {
            self.flush_events();
        }
        self.render_loop.is_running()
    }

    fn flush_events(&mut self) {
        for event in self.backdrop.events_mut().drain() {
            dom::log(&format!(
                "[backdrop #{}] {}: {}",
                event.frame_index,
                event.kind.as_str(),
                event.message
            ));
        }
    }

    /// Re-measures the window and rebuilds every size-dependent resource.
    fn rebuild(&mut self) -> Result<(), JsValue> {
        let viewport = dom::read_viewport(&self.window)?;
        let store = self.config.viewport.backing_store(viewport);
        dom::apply_backing_store(self.stars.canvas(), store);
        dom::apply_backing_store(&self.bg_canvas, store);
        self.backdrop
            .resize(store, store.pixel_scale(viewport), &mut self.rng);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(TargetSizes::for_store(store));
            gpu.sync_geometry(&self.backdrop);
        }
        self.render_loop.stats_mut().record_rebuild();
        Ok(())
    }

    fn on_resize_event(&mut self) {
        self.debounce.trigger(dom::now_ms());
        if let Err(err) = self.resize_timer.schedule(self.debounce.delay_ms()) {
            dom::error(&format!("resize timer: {:?}", err));
        }
    }

    fn on_resize_timer(&mut self) {
        if self.debounce.fire_due(dom::now_ms()) {
            if let Err(err) = self.rebuild() {
                dom::error(&format!("resize failed: {:?}", err));
            }
        }
    }

    fn attach_gpu(&mut self, mut gpu: GpuBackdrop) {
        for err in gpu.take_shader_errors() {
            let msg = err.to_string();
            dom::error(&msg);
            if self.config.alert_on_shader_error {
                dom::alert(&msg);
            }
            self.backdrop.record(EventKind::PassDisabled, err.label());
        }
        gpu.sync_geometry(&self.backdrop);
        self.resources.cloud_ready = true;
        self.gpu = Some(gpu);
    }

    fn gpu_unavailable(&mut self, err: JsValue) {
        dom::error(&format!("GPU unavailable, hiding background: {:?}", err));
        if let Err(e) = dom::hide(&self.bg_canvas) {
            dom::error(&format!("could not hide background canvas: {:?}", e));
        }
        self.backdrop
            .record(EventKind::GpuUnavailable, format!("{:?}", err));
    }

    fn blue_noise_loaded(&mut self, result: Result<DecodedTexture, AssetError>) {
        match result {
            Ok(texture) => {
                let Some(gpu) = self.gpu.as_mut() else {
                    return;
                };
                gpu.set_blue_noise(&texture);
                self.resources.blue_noise_ready = true;
                self.backdrop.record(
                    EventKind::AssetReady,
                    format!("blue noise {}x{}", texture.width, texture.height),
                );
            }
            Err(err) => {
                dom::error(&format!("{} ({})", err, self.config.blue_noise_url));
                self.backdrop.record(EventKind::AssetFailed, err.to_string());
            }
        }
    }

    fn disabled_passes(&self) -> PassSet {
        self.gpu.as_ref().map(|g| g.disabled()).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct StatsReport<'a> {
    running: bool,
    generation: u64,
    gpu: bool,
    blue_noise_ready: bool,
    disabled_passes: Vec<&'static str>,
    events_dropped: u64,
    frames: &'a FrameStats,
}

async fn init_gpu(session: u64, canvas: web_sys::HtmlCanvasElement, sizes: TargetSizes, url: String) {
    let Some(cloud) = with_session(session, |app| app.backdrop.cloud_texture()) else {
        return;
    };
    match GpuBackdrop::init(canvas, sizes, &cloud).await {
        Ok(gpu) => {
            if with_session(session, |app| app.attach_gpu(gpu)).is_none() {
                return;
            }
        }
        Err(err) => {
            with_session(session, |app| app.gpu_unavailable(err));
            return;
        }
    }

    let result = fetch_blue_noise(&url).await;
    with_session(session, |app| app.blue_noise_loaded(result));
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Starts the backdrop. `config_json` may be omitted or partial; unknown
/// canvases or invalid values are reported as errors.
#[wasm_bindgen]
pub fn start_backdrop(config_json: Option<String>) -> Result<(), JsValue> {
    let config = BackdropConfig::from_json(config_json.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    stop_backdrop();

    let window = dom::window()?;
    let document = dom::document()?;
    let fg_canvas = dom::canvas_by_id(&document, &config.fg_canvas_id)?;
    let bg_canvas = dom::canvas_by_id(&document, &config.bg_canvas_id)?;

    let viewport = dom::read_viewport(&window)?;
    let store = config.viewport.backing_store(viewport);
    dom::apply_backing_store(&fg_canvas, store);
    dom::apply_backing_store(&bg_canvas, store);

    let mut rng = fastrand::Rng::with_seed((js_sys::Math::random() * u64::MAX as f64) as u64);
    let mut backdrop = Backdrop::new(config.scene.clone(), store, &mut rng)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    backdrop.set_pixel_scale(store.pixel_scale(viewport));
    let stars = StarLayer::new(fg_canvas)?;

    let session = SESSION.with(|s| {
        s.set(s.get() + 1);
        s.get()
    });

    let observer = SectionObserver::observe(
        &document,
        &config.section_selector,
        &config.color_attribute,
        &config.observer_root_margin,
        move |color: Rgb| {
            with_session(session, |app| app.backdrop.set_color_target(color));
        },
    )?;
    let resize = ResizeListener::attach(&window, move || {
        with_session(session, |app| app.on_resize_event());
    })?;
    let resize_timer = Timer::new(&window, move || {
        with_session(session, |app| app.on_resize_timer());
    });

    let mut render_loop = RenderLoop::new();
    render_loop.start();

    let mut app = App {
        session,
        debounce: Debouncer::new(config.resize_debounce_ms),
        window,
        bg_canvas: bg_canvas.clone(),
        backdrop,
        rng,
        stars,
        gpu: None,
        resources: ResourceState::default(),
        render_loop,
        resize_timer,
        _resize: resize,
        _observer: Some(observer),
        driver: AnimationDriver::new(),
        config,
    };
    app.backdrop.record(
        EventKind::LoopStarted,
        format!("{}x{} session {}", store.width, store.height, session),
    );
    app.driver.start(move |timestamp_ms| {
        with_session(session, |app| app.frame(timestamp_ms)).unwrap_or(false)
    })?;

    let url = app.config.blue_noise_url.clone();
    APP.with(|cell| *cell.borrow_mut() = Some(app));

    spawn_local(init_gpu(session, bg_canvas, TargetSizes::for_store(store), url));
    Ok(())
}

/// Stops the loop and unhooks every listener. Safe to call when not running.
#[wasm_bindgen]
pub fn stop_backdrop() {
    let app = APP.with(|cell| cell.borrow_mut().take());
    if let Some(mut app) = app {
        app.driver.cancel();
        app.render_loop.stop();
        app.backdrop
            .record(EventKind::LoopStopped, format!("session {}", app.session));
        if app.config.trace_events {
            app.flush_events();
        }
    }
}

#[wasm_bindgen]
pub fn set_color_target(r: f64, g: f64, b: f64) -> Result<(), JsValue> {
    let color = Rgb::new(r, g, b);
    if !color.is_valid() {
        return Err(JsValue::from_str(&format!(
            "color channels must be finite and within 0..=255, got ({r}, {g}, {b})"
        )));
    }
    with_app(|app| app.backdrop.set_color_target(color))
        .ok_or_else(|| JsValue::from_str("backdrop is not running"))
}

/// Rebuilds immediately, bypassing the resize debounce.
#[wasm_bindgen]
pub fn resize_backdrop() -> Result<(), JsValue> {
    with_app(|app| {
        app.debounce.cancel();
        app.resize_timer.clear();
        app.rebuild()
    })
    .ok_or_else(|| JsValue::from_str("backdrop is not running"))?
}

/// Frame counters and resource state as a JSON string.
#[wasm_bindgen]
pub fn backdrop_stats() -> Result<String, JsValue> {
    with_app(|app| {
        let disabled = app.disabled_passes();
        let report = StatsReport {
            running: app.render_loop.is_running(),
            generation: app.backdrop.generation(),
            gpu: app.gpu.is_some(),
            blue_noise_ready: app.resources.blue_noise_ready,
            disabled_passes: PassKind::ALL
                .into_iter()
                .filter(|k| disabled.contains(*k))
                .map(PassKind::as_str)
                .collect(),
            events_dropped: app.backdrop.events().dropped(),
            frames: app.render_loop.stats(),
        };
        serde_json::to_string(&report).map_err(|e| JsValue::from_str(&e.to_string()))
    })
    .ok_or_else(|| JsValue::from_str("backdrop is not running"))?
}
