//! Scroll-driven camera and the grid projection.
//!
//! The projection is a hand-tuned tilt, not a physical camera: the grid is
//! rotated about the X axis with an amplified Y term (`TILT_GAIN`) and a small
//! depth shear (`DEPTH_SHEAR`), then perspective-divided by the rotated depth.
//! The GPU shaders evaluate the same formulas; keep both in sync.

use foundation::math::{Smoothed, Vec2, Vec3};
use foundation::viewport::BackingStore;
use serde::{Deserialize, Serialize};

/// Rotated depth at or below which nothing is drawn.
pub const NEAR_CUTOFF: f64 = 20.0;
/// Gain on the scroll-translated Y before rotation.
pub const TILT_GAIN: f64 = 41.0;
/// Depth contribution to rotated Y.
pub const DEPTH_SHEAR: f64 = 0.1;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov: f64,
    pub lerp_factor: f64,
    /// Camera Y at the top of the page; it reaches 0 at the bottom.
    pub scroll_travel: f64,
    /// Tilt at the bottom of the page, radians.
    pub base_pitch_rad: f64,
    /// Extra tilt toward the top of the page, degrees.
    pub pitch_sweep_deg: f64,
    pub near_cutoff: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 355.0,
            lerp_factor: 0.07,
            scroll_travel: 12.0,
            base_pitch_rad: 1.45,
            pitch_sweep_deg: 3.0,
            near_cutoff: NEAR_CUTOFF,
        }
    }
}

impl CameraSettings {
    pub fn target_y(&self, scroll_ratio: f64) -> f64 {
        self.scroll_travel * (1.0 - scroll_ratio)
    }

    pub fn target_rotation_x(&self, scroll_ratio: f64) -> f64 {
        self.base_pitch_rad + (self.pitch_sweep_deg * (scroll_ratio - 1.0)).to_radians()
    }
}

/// A grid point after the camera tilt, before the perspective divide.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraSpace {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

/// Result of projecting a visible point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projected {
    pub position: Vec2,
    /// `focal_px / depth`; sizes attenuate with it.
    pub scale: f64,
    pub depth: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub fov: f64,
    pub y: Smoothed,
    pub rotation_x: Smoothed,
    pub lerp_factor: f64,
    pub near_cutoff: f64,
    /// Backing-store pixels per CSS pixel; `fov` is tuned in CSS pixels.
    pub pixel_scale: f64,
}

impl Camera {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            fov: settings.fov,
            y: Smoothed::new(0.0),
            rotation_x: Smoothed::new(0.0),
            lerp_factor: settings.lerp_factor,
            near_cutoff: settings.near_cutoff,
            pixel_scale: 1.0,
        }
    }

    /// Focal length in backing-store pixels.
    pub fn focal_px(&self) -> f64 {
        self.fov * self.pixel_scale
    }

    /// Sets the targets for a scroll position in `0.0..=1.0`.
    pub fn aim(&mut self, scroll_ratio: f64, settings: &CameraSettings) {
        self.y.set_target(settings.target_y(scroll_ratio));
        self.rotation_x
            .set_target(settings.target_rotation_x(scroll_ratio));
    }

    /// Remaining `(|Δy|, |Δrotation|)` toward the targets.
    pub fn pending_motion(&self) -> (f64, f64) {
        (self.y.delta(), self.rotation_x.delta())
    }

    pub fn step(&mut self) {
        self.y.step(self.lerp_factor);
        self.rotation_x.step(self.lerp_factor);
    }

    pub fn transform(&self, p: Vec3) -> CameraSpace {
        let (sin_x, cos_x) = self.rotation_x.current.sin_cos();
        let translated_y = p.y - self.y.current;
        CameraSpace {
            x: p.x,
            y: TILT_GAIN * translated_y * cos_x - DEPTH_SHEAR * p.z * sin_x,
            depth: p.z * cos_x,
        }
    }

    pub fn is_visible(&self, p: Vec3) -> bool {
        self.transform(p).depth > self.near_cutoff
    }

    /// Canvas pixels, origin top-left, Y down.
    pub fn project_to_canvas(&self, p: Vec3, store: BackingStore) -> Option<Projected> {
        let cs = self.transform(p);
        if cs.depth <= self.near_cutoff {
            return None;
        }
        let scale = self.focal_px() / cs.depth;
        let center = store.center();
        Some(Projected {
            position: Vec2::new(center.x + cs.x * scale, center.y - cs.y * scale),
            scale,
            depth: cs.depth,
        })
    }

    /// Clip space, origin at the center, Y up.
    pub fn project_to_clip(&self, p: Vec3, store: BackingStore) -> Option<Projected> {
        let cs = self.transform(p);
        if cs.depth <= self.near_cutoff {
            return None;
        }
        let scale = self.focal_px() / cs.depth;
        let half = store.center();
        Some(Projected {
            position: Vec2::new(cs.x * scale / half.x, cs.y * scale / half.y),
            scale,
            depth: cs.depth,
        })
    }
}
