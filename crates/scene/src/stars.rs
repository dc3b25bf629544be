use foundation::viewport::BackingStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarSettings {
    pub count: usize,
    /// CSS color used to fill every star.
    pub color: String,
}

impl Default for StarSettings {
    fn default() -> Self {
        Self {
            count: 40,
            color: "#dce2f0".to_string(),
        }
    }
}

/// A star on the 2D overlay, in backing-store pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Star {
    pub x: f64,
    /// Base height before the parallax shift; starts above the viewport.
    pub y: f64,
    /// Parallax factor: how far the star moves per scrolled pixel.
    pub depth: f64,
    /// Radius.
    pub size: f64,
}

impl Star {
    pub fn sample(store: BackingStore, rng: &mut fastrand::Rng) -> Self {
        let (w, h) = (store.width as f64, store.height as f64);
        Self {
            x: (0.15 + 0.7 * rng.f64()) * w,
            y: (rng.f64() * 0.8 - 0.5) * h,
            depth: rng.f64() * 0.4 + 0.1,
            size: rng.f64() * 1.2 + 0.5,
        }
    }

    pub fn screen_y(&self, scroll_offset: f64, store_height: f64) -> f64 {
        self.y - scroll_offset * self.depth + store_height
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Starfield {
    pub stars: Vec<Star>,
}

impl Starfield {
    /// Fresh random field for a backing store; called on every rebuild.
    pub fn generate(count: usize, store: BackingStore, rng: &mut fastrand::Rng) -> Self {
        Self {
            stars: (0..count).map(|_| Star::sample(store, rng)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Star> {
        self.stars.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Star, StarSettings, Starfield};
    use foundation::viewport::BackingStore;

    #[test]
    fn stars_stay_in_their_bands() {
        let store = BackingStore::new(1600, 900);
        let mut rng = fastrand::Rng::with_seed(7);
        let field = Starfield::generate(StarSettings::default().count, store, &mut rng);
        assert_eq!(field.len(), 40);
        for s in field.iter() {
            assert!(s.x >= 0.15 * 1600.0 && s.x <= 0.85 * 1600.0);
            assert!(s.y >= -0.5 * 900.0 && s.y <= 0.3 * 900.0);
            assert!(s.depth >= 0.1 && s.depth <= 0.5);
            assert!(s.size >= 0.5 && s.size <= 1.7);
        }
    }

    #[test]
    fn same_seed_same_field() {
        let store = BackingStore::new(800, 600);
        let a = Starfield::generate(10, store, &mut fastrand::Rng::with_seed(3));
        let b = Starfield::generate(10, store, &mut fastrand::Rng::with_seed(3));
        assert_eq!(a, b);
    }

    #[test]
    fn parallax_moves_deeper_stars_faster() {
        let near = Star { x: 0.0, y: -100.0, depth: 0.1, size: 1.0 };
        let far = Star { depth: 0.5, ..near };
        assert_eq!(near.screen_y(0.0, 900.0), 800.0);
        assert_eq!(near.screen_y(1000.0, 900.0), 700.0);
        assert_eq!(far.screen_y(1000.0, 900.0), 300.0);
    }
}
