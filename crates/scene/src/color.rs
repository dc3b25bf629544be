use foundation::color::Rgb;
use foundation::math::approach;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    /// Tint before any section has been observed.
    pub initial: Rgb,
    pub smoothing: f64,
    /// Alpha of the grid lines.
    pub line_alpha: f64,
    /// Nodes lean toward this color so they stay visible on any tint.
    pub node_base: Rgb,
    /// Weight of the section tint in the node color.
    pub node_mix: f64,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            initial: Rgb::new(50.0, 80.0, 220.0),
            smoothing: 0.02,
            line_alpha: 0.16,
            node_base: Rgb::new(80.0, 130.0, 255.0),
            node_mix: 0.35,
        }
    }
}

/// Current tint and the tint it is easing toward.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorState {
    pub current: Rgb,
    pub target: Rgb,
    pub smoothing: f64,
}

impl ColorState {
    pub fn new(settings: &ColorSettings) -> Self {
        Self {
            current: settings.initial,
            target: settings.initial,
            smoothing: settings.smoothing,
        }
    }

    pub fn set_target(&mut self, target: Rgb) {
        self.target = target;
    }

    pub fn delta(&self) -> f64 {
        self.current.max_delta(self.target)
    }

    pub fn step(&mut self) {
        let f = self.smoothing;
        self.current = Rgb::new(
            approach(self.current.r, self.target.r, f),
            approach(self.current.g, self.target.g, f),
            approach(self.current.b, self.target.b, f),
        );
    }

    pub fn node_tint(&self, settings: &ColorSettings) -> Rgb {
        self.current.mix(settings.node_base, settings.node_mix)
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorSettings, ColorState};
    use foundation::color::Rgb;

    #[test]
    fn starts_at_initial_tint() {
        let c = ColorState::new(&ColorSettings::default());
        assert_eq!(c.current, Rgb::new(50.0, 80.0, 220.0));
        assert_eq!(c.delta(), 0.0);
    }

    #[test]
    fn every_channel_contracts_toward_target() {
        let mut c = ColorState::new(&ColorSettings::default());
        c.set_target(Rgb::new(255.0, 0.0, 100.0));
        let mut prev = c;
        for _ in 0..500 {
            c.step();
            for (now, before, goal) in [
                (c.current.r, prev.current.r, 255.0),
                (c.current.g, prev.current.g, 0.0),
                (c.current.b, prev.current.b, 100.0),
            ] {
                let before_gap: f64 = (before - goal).abs();
                if before_gap > 0.0 {
                    assert!((now - goal).abs() < before_gap);
                }
            }
            prev = c;
        }
        assert!(c.delta() < 0.01);
    }

    #[test]
    fn node_tint_is_weighted_toward_base() {
        let settings = ColorSettings::default();
        let c = ColorState::new(&settings);
        let tint = c.node_tint(&settings);
        assert!((tint.r - (50.0 * 0.35 + 80.0 * 0.65)).abs() < 1e-9);
        assert!((tint.g - (80.0 * 0.35 + 130.0 * 0.65)).abs() < 1e-9);
        assert!((tint.b - (220.0 * 0.35 + 255.0 * 0.65)).abs() < 1e-9);
    }
}
