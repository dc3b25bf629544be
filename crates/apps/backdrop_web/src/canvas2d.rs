//! Star overlay drawn on the 2D canvas.

use foundation::viewport::BackingStore;
use scene::Starfield;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// One filled circle, in backing-store pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StarDraw {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Screen positions for every star. `scroll_offset` is in CSS pixels and
/// star radii are tuned in CSS pixels; both are scaled by `pixel_scale`.
pub fn star_draws(
    stars: &Starfield,
    scroll_offset: f64,
    store: BackingStore,
    pixel_scale: f64,
) -> Vec<StarDraw> {
    let height = store.height as f64;
    let offset = scroll_offset * pixel_scale;
    stars
        .iter()
        .map(|s| StarDraw {
            x: s.x,
            y: s.screen_y(offset, height),
            radius: s.size * pixel_scale,
        })
        .collect()
}

pub struct StarLayer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl StarLayer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn draw(
        &self,
        stars: &Starfield,
        scroll_offset: f64,
        store: BackingStore,
        pixel_scale: f64,
        color: &str,
    ) -> Result<(), JsValue> {
        let size = store.size_f64();
        self.ctx.clear_rect(0.0, 0.0, size.x, size.y);
        self.ctx.set_fill_style_str(color);
        for star in star_draws(stars, scroll_offset, store, pixel_scale) {
            self.ctx.begin_path();
            self.ctx
                .arc(star.x, star.y, star.radius, 0.0, std::f64::consts::TAU)?;
            self.ctx.fill();
        }
        Ok(())
    }
}
