//! Canvas backing-store sizing.
//!
//! The backing store is the viewport in CSS pixels times a capped device
//! pixel ratio. If the larger axis still exceeds `max_resolution`, both axes
//! are scaled down together so the aspect ratio is kept and the larger axis
//! lands exactly on the cap.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Viewport as reported by the window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub css_width: f64,
    pub css_height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            css_width,
            css_height,
            device_pixel_ratio,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportPolicy {
    pub max_device_pixel_ratio: f64,
    /// Cap on the larger backing-store axis, in device pixels.
    pub max_resolution: f64,
}

impl Default for ViewportPolicy {
    fn default() -> Self {
        Self {
            max_device_pixel_ratio: 2.0,
            max_resolution: 2560.0,
        }
    }
}

impl ViewportPolicy {
    pub fn is_valid(&self) -> bool {
        self.max_device_pixel_ratio.is_finite()
            && self.max_device_pixel_ratio > 0.0
            && self.max_resolution.is_finite()
            && self.max_resolution >= 1.0
    }

    pub fn backing_store(&self, viewport: Viewport) -> BackingStore {
        let dpr = if viewport.device_pixel_ratio.is_finite() && viewport.device_pixel_ratio > 0.0 {
            viewport.device_pixel_ratio.min(self.max_device_pixel_ratio)
        } else {
            1.0
        };

        let mut width = sanitize(viewport.css_width) * dpr;
        let mut height = sanitize(viewport.css_height) * dpr;

        let larger = width.max(height);
        if larger > self.max_resolution {
            // Multiply before dividing so exact ratios stay exact.
            if width >= height {
                height = height * self.max_resolution / width;
                width = self.max_resolution;
            } else {
                width = width * self.max_resolution / height;
                height = self.max_resolution;
            }
        }

        BackingStore {
            width: to_pixels(width),
            height: to_pixels(height),
        }
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

fn to_pixels(v: f64) -> u32 {
    // Canvas sizes truncate; the epsilon absorbs representation error.
    ((v + 1e-6).floor() as u32).max(1)
}

/// Size of a canvas backing store in device pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BackingStore {
    pub width: u32,
    pub height: u32,
}

impl BackingStore {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f64 * 0.5, self.height as f64 * 0.5)
    }

    pub fn size_f64(&self) -> Vec2 {
        Vec2::new(self.width as f64, self.height as f64)
    }

    /// Backing-store pixels per CSS pixel for the viewport this store was
    /// sized from. Lengths tuned in CSS pixels are multiplied by this.
    pub fn pixel_scale(&self, viewport: Viewport) -> f64 {
        let css = viewport.css_height;
        if css.is_finite() && css > 0.0 {
            self.height as f64 / css
        } else {
            1.0
        }
    }

    /// Scaled size for reduced-resolution targets, truncated, at least 1×1.
    pub fn scaled(&self, factor: f64) -> BackingStore {
        BackingStore::new(
            (self.width as f64 * factor).floor() as u32,
            (self.height as f64 * factor).floor() as u32,
        )
    }
}
