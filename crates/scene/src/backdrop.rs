//! The backdrop context: everything the frame loop reads and mutates.
//!
//! One `Backdrop` owns the camera, the tint, the static grid, the starfield
//! and the lifecycle event log. The browser layer feeds it scroll samples,
//! color targets and resizes; the GPU layer reads it to fill uniforms.

use crate::camera::{Camera, CameraSettings};
use crate::color::{ColorSettings, ColorState};
use crate::grid::{GridGeometry, GridSpec};
use crate::noise::{CloudTexture, NoiseSettings};
use crate::scroll::ScrollSample;
use crate::stars::{StarSettings, Starfield};
use foundation::color::Rgb;
use foundation::math::is_valid_factor;
use foundation::viewport::BackingStore;
use runtime::{EventBus, EventKind, Frame};
use serde::{Deserialize, Serialize};

/// Skips redraws while nothing is moving. Off by default.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdlePolicy {
    pub enabled: bool,
    pub camera_y_epsilon: f64,
    pub rotation_epsilon: f64,
    /// Largest per-channel tint gap, 0–255 units.
    pub color_epsilon: f64,
    /// Frames before this timestamp always render.
    pub warmup_ms: f64,
}

impl Default for IdlePolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            camera_y_epsilon: 0.01,
            rotation_epsilon: 0.001,
            color_epsilon: 0.01,
            warmup_ms: 1000.0,
        }
    }
}

impl IdlePolicy {
    pub fn is_idle(&self, camera: &Camera, color: &ColorState, frame: &Frame) -> bool {
        if !self.enabled || frame.timestamp_ms <= self.warmup_ms {
            return false;
        }
        let (dy, drot) = camera.pending_motion();
        dy < self.camera_y_epsilon
            && drot < self.rotation_epsilon
            && color.delta() < self.color_epsilon
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropSettings {
    pub grid: GridSpec,
    pub camera: CameraSettings,
    pub color: ColorSettings,
    pub stars: StarSettings,
    pub noise: NoiseSettings,
    pub idle: IdlePolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    InvalidFactor { name: &'static str, value: f64 },
    NotPositive { name: &'static str, value: f64 },
    NotFinite(&'static str),
    InvalidColor(&'static str),
    OutOfRange { name: &'static str, value: f64, max: f64 },
    EmptyGrid,
}

/// Upper bounds on the sizes that drive allocation and integer math.
pub const MAX_NOISE_SIZE: u32 = 4096;
pub const MAX_NOISE_OCTAVES: u32 = 8;
pub const MAX_NOISE_LACUNARITY: u32 = 8;
pub const MAX_GRID_EXTENT: i32 = 1024;
pub const MAX_STARS: usize = 10_000;

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::InvalidFactor { name, value } => {
                write!(f, "{name} must be in (0, 1], got {value}")
            }
            SettingsError::NotPositive { name, value } => {
                write!(f, "{name} must be positive and finite, got {value}")
            }
            SettingsError::NotFinite(name) => write!(f, "{name} must be finite"),
            SettingsError::InvalidColor(name) => {
                write!(f, "{name} must have finite channels in 0..=255")
            }
            SettingsError::OutOfRange { name, value, max } => {
                write!(f, "{name} must be at most {max}, got {value}")
            }
            SettingsError::EmptyGrid => write!(f, "grid has no rows or columns"),
        }
    }
}

impl std::error::Error for SettingsError {}

fn positive(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::NotPositive { name, value })
    }
}

fn at_most(name: &'static str, value: f64, max: f64) -> Result<(), SettingsError> {
    if value <= max {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange { name, value, max })
    }
}

fn factor(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if is_valid_factor(value) {
        Ok(())
    } else {
        Err(SettingsError::InvalidFactor { name, value })
    }
}

impl BackdropSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        factor("camera.lerp_factor", self.camera.lerp_factor)?;
        factor("color.smoothing", self.color.smoothing)?;
        factor("color.node_mix", self.color.node_mix)?;
        factor("color.line_alpha", self.color.line_alpha)?;
        positive("camera.fov", self.camera.fov)?;
        positive("camera.near_cutoff", self.camera.near_cutoff)?;
        positive("grid.spacing", self.grid.spacing)?;
        positive("grid.depth_stretch", self.grid.depth_stretch)?;
        positive("noise.size", self.noise.size as f64)?;
        positive("noise.base_frequency", self.noise.base_frequency as f64)?;
        for (name, value, max) in [
            ("noise.size", self.noise.size as f64, MAX_NOISE_SIZE as f64),
            ("noise.base_frequency", self.noise.base_frequency as f64, MAX_NOISE_SIZE as f64),
            ("noise.octaves", self.noise.octaves as f64, MAX_NOISE_OCTAVES as f64),
            ("noise.lacunarity", self.noise.lacunarity as f64, MAX_NOISE_LACUNARITY as f64),
            ("grid.half_width", self.grid.half_width as f64, MAX_GRID_EXTENT as f64),
            ("grid.depth_segments", self.grid.depth_segments as f64, MAX_GRID_EXTENT as f64),
            ("stars.count", self.stars.count as f64, MAX_STARS as f64),
        ] {
            at_most(name, value, max)?;
        }
        for (name, value) in [
            ("camera.scroll_travel", self.camera.scroll_travel),
            ("camera.base_pitch_rad", self.camera.base_pitch_rad),
            ("camera.pitch_sweep_deg", self.camera.pitch_sweep_deg),
        ] {
            if !value.is_finite() {
                return Err(SettingsError::NotFinite(name));
            }
        }
        if !self.color.initial.is_valid() {
            return Err(SettingsError::InvalidColor("color.initial"));
        }
        if !self.color.node_base.is_valid() {
            return Err(SettingsError::InvalidColor("color.node_base"));
        }
        if self.grid.node_count() == 0 || self.grid.first_row < 1 {
            return Err(SettingsError::EmptyGrid);
        }
        Ok(())
    }
}

/// What the frame loop should do after [`Backdrop::advance`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameUpdate {
    pub redraw: bool,
}

#[derive(Debug)]
pub struct Backdrop {
    settings: BackdropSettings,
    camera: Camera,
    color: ColorState,
    store: BackingStore,
    geometry: GridGeometry,
    stars: Starfield,
    scroll: ScrollSample,
    events: EventBus,
    /// Bumped on every rebuild; GPU buffers compare against it.
    generation: u64,
    noise_seed: f64,
    frame_index: u64,
}

impl Backdrop {
    pub fn new(
        settings: BackdropSettings,
        store: BackingStore,
        rng: &mut fastrand::Rng,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let geometry = GridGeometry::build(&settings.grid);
        let stars = Starfield::generate(settings.stars.count, store, rng);
        // Small seeds keep the sine argument in its precise range.
        let noise_seed = rng.f64() * 100.0;
        Ok(Self {
            camera: Camera::new(&settings.camera),
            color: ColorState::new(&settings.color),
            settings,
            store,
            geometry,
            stars,
            scroll: ScrollSample::default(),
            events: EventBus::new(),
            generation: 0,
            noise_seed,
            frame_index: 0,
        })
    }

    pub fn settings(&self) -> &BackdropSettings {
        &self.settings
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn color(&self) -> &ColorState {
        &self.color
    }

    pub fn store(&self) -> BackingStore {
        self.store
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn stars(&self) -> &Starfield {
        &self.stars
    }

    /// Backing-store pixels per CSS pixel.
    pub fn pixel_scale(&self) -> f64 {
        self.camera.pixel_scale
    }

    /// Ignores non-finite or non-positive scales.
    pub fn set_pixel_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.camera.pixel_scale = scale;
        }
    }

    pub fn scroll(&self) -> ScrollSample {
        self.scroll
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn record(&mut self, kind: EventKind, message: impl Into<String>) {
        self.events.emit(self.frame_index, kind, message);
    }

    /// Rebuilds everything sized by the backing store.
    pub fn resize(&mut self, store: BackingStore, pixel_scale: f64, rng: &mut fastrand::Rng) {
        self.store = store;
        self.set_pixel_scale(pixel_scale);
        self.stars = Starfield::generate(self.settings.stars.count, store, rng);
        self.geometry = GridGeometry::build(&self.settings.grid);
        self.generation += 1;
        self.record(
            EventKind::Rebuild,
            format!("{}x{} gen {}", store.width, store.height, self.generation),
        );
    }

    pub fn set_color_target(&mut self, target: Rgb) {
        if target == self.color.target {
            return;
        }
        self.color.set_target(target);
        self.record(
            EventKind::ColorTarget,
            format!("{},{},{}", target.r, target.g, target.b),
        );
    }

    pub fn cloud_texture(&self) -> CloudTexture {
        CloudTexture::generate(&self.settings.noise, self.noise_seed)
    }

    /// One tick: aim at the scroll position, ease camera and tint.
    pub fn advance(&mut self, frame: &Frame, scroll: ScrollSample) -> FrameUpdate {
        self.frame_index = frame.index;
        self.scroll = scroll;
        let scroll_ratio = scroll.ratio();
        self.camera.aim(scroll_ratio, &self.settings.camera);

        if self.settings.idle.is_idle(&self.camera, &self.color, frame) {
            return FrameUpdate { redraw: false };
        }

        self.camera.step();
        self.color.step();
        FrameUpdate { redraw: true }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Backdrop, BackdropSettings, IdlePolicy, MAX_GRID_EXTENT, MAX_NOISE_LACUNARITY,
        MAX_NOISE_OCTAVES, SettingsError,
    };
    use crate::scroll::ScrollSample;
    use foundation::color::Rgb;
    use foundation::viewport::BackingStore;
    use pretty_assertions::assert_eq;
    use runtime::{EventKind, Frame};

    fn backdrop(settings: BackdropSettings) -> Backdrop {
        let mut rng = fastrand::Rng::with_seed(11);
        Backdrop::new(settings, BackingStore::new(1280, 720), &mut rng).unwrap()
    }

    #[test]
    fn defaults_validate() {
        assert_eq!(BackdropSettings::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: BackdropSettings =
            serde_json::from_str(r#"{"camera":{"fov":400},"idle":{"enabled":true}}"#).unwrap();
        assert_eq!(s.camera.fov, 400.0);
        assert_eq!(s.camera.lerp_factor, 0.07);
        assert!(s.idle.enabled);
        assert_eq!(s.grid, crate::grid::GridSpec::default());
        assert_eq!(s.color.initial, Rgb::new(50.0, 80.0, 220.0));
    }

    #[test]
    fn rejects_bad_factors_and_colors() {
        let mut s = BackdropSettings::default();
        s.camera.lerp_factor = 0.0;
        assert!(matches!(
            s.validate(),
            Err(SettingsError::InvalidFactor { name: "camera.lerp_factor", .. })
        ));

        let mut s = BackdropSettings::default();
        s.color.smoothing = f64::NAN;
        assert!(s.validate().is_err());

        let mut s = BackdropSettings::default();
        s.color.initial = Rgb::new(300.0, 0.0, 0.0);
        assert_eq!(s.validate(), Err(SettingsError::InvalidColor("color.initial")));

        let mut s = BackdropSettings::default();
        s.grid.depth_segments = 0;
        assert_eq!(s.validate(), Err(SettingsError::EmptyGrid));
    }

    #[test]
    fn rejects_sizes_past_their_bounds() {
        let out_of_range = |s: &BackdropSettings| match s.validate() {
            Err(SettingsError::OutOfRange { name, .. }) => Some(name),
            _ => None,
        };

        let mut s = BackdropSettings::default();
        s.noise.octaves = 40;
        assert_eq!(out_of_range(&s), Some("noise.octaves"));

        let mut s = BackdropSettings::default();
        s.noise.lacunarity = 1000;
        assert_eq!(out_of_range(&s), Some("noise.lacunarity"));

        let mut s = BackdropSettings::default();
        s.noise.size = 40_000;
        assert_eq!(out_of_range(&s), Some("noise.size"));

        let mut s = BackdropSettings::default();
        s.grid.half_width = i32::MAX;
        assert_eq!(out_of_range(&s), Some("grid.half_width"));

        let mut s = BackdropSettings::default();
        s.grid.depth_segments = 5000;
        assert_eq!(out_of_range(&s), Some("grid.depth_segments"));

        let mut s = BackdropSettings::default();
        s.stars.count = 1_000_000;
        assert_eq!(out_of_range(&s), Some("stars.count"));
    }

    #[test]
    fn largest_accepted_sizes_still_build() {
        let mut s = BackdropSettings::default();
        s.noise.size = 64;
        s.noise.octaves = MAX_NOISE_OCTAVES;
        s.noise.lacunarity = MAX_NOISE_LACUNARITY;
        s.grid.half_width = MAX_GRID_EXTENT;
        s.grid.depth_segments = 4;
        assert_eq!(s.validate(), Ok(()));
        let b = backdrop(s);
        assert_eq!(b.geometry().nodes.len(), (2 * 1024 + 1) * 4);
        assert_eq!(b.cloud_texture().pixels.len(), 64 * 64 * 4);
    }

    #[test]
    fn advance_moves_camera_toward_scroll_target() {
        let mut b = backdrop(BackdropSettings::default());
        let frame = Frame::first(16.0);
        let update = b.advance(&frame, ScrollSample::new(0.0, 3000.0, 1000.0));
        assert!(update.redraw);
        assert_eq!(b.camera().y.target, 12.0);
        assert!((b.camera().y.current - 12.0 * 0.07).abs() < 1e-12);
    }

    #[test]
    fn resize_rebuilds_and_bumps_generation() {
        let mut b = backdrop(BackdropSettings::default());
        let mut rng = fastrand::Rng::with_seed(5);
        b.resize(BackingStore::new(640, 480), 1.5, &mut rng);
        assert_eq!(b.generation(), 1);
        assert_eq!(b.pixel_scale(), 1.5);
        assert_eq!(b.camera().focal_px(), 355.0 * 1.5);
        assert_eq!(b.store(), BackingStore::new(640, 480));
        assert_eq!(b.stars().len(), 40);
        assert_eq!(b.geometry().lines.len(), 1890);
        let e = b.events().iter().last().unwrap();
        assert_eq!(e.kind, EventKind::Rebuild);
        assert_eq!(e.message, "640x480 gen 1");
    }

    #[test]
    fn bad_pixel_scales_are_ignored() {
        let mut b = backdrop(BackdropSettings::default());
        assert_eq!(b.pixel_scale(), 1.0);
        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            b.set_pixel_scale(bad);
            assert_eq!(b.pixel_scale(), 1.0);
        }
    }

    #[test]
    fn color_target_is_recorded_once() {
        let mut b = backdrop(BackdropSettings::default());
        b.set_color_target(Rgb::new(200.0, 60.0, 90.0));
        b.set_color_target(Rgb::new(200.0, 60.0, 90.0));
        assert_eq!(b.events().len(), 1);
        assert_eq!(b.color().target, Rgb::new(200.0, 60.0, 90.0));
    }

    #[test]
    fn idle_policy_skips_settled_frames_after_warmup() {
        let mut settings = BackdropSettings::default();
        settings.idle = IdlePolicy {
            enabled: true,
            ..IdlePolicy::default()
        };
        let mut b = backdrop(settings);
        let scroll = ScrollSample::new(2000.0, 3000.0, 1000.0);

        // Warmup frames always render.
        assert!(b.advance(&Frame::first(500.0), scroll).redraw);

        let mut frame = Frame::first(500.0);
        let mut skipped = false;
        for i in 0..2000 {
            frame = frame.next(500.0 + 16.0 * (i + 1) as f64);
            if !b.advance(&frame, scroll).redraw {
                skipped = true;
                break;
            }
        }
        assert!(skipped);
        let (dy, drot) = b.camera().pending_motion();
        assert!(dy < 0.01 && drot < 0.001);
    }

    #[test]
    fn idle_policy_off_always_redraws() {
        let mut b = backdrop(BackdropSettings::default());
        let scroll = ScrollSample::default();
        let mut frame = Frame::first(5000.0);
        for _ in 0..10 {
            assert!(b.advance(&frame, scroll).redraw);
            frame = frame.next(frame.timestamp_ms + 16.0);
        }
    }
}
