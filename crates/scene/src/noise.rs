//! Procedural cloud texture.
//!
//! Fractal value noise over a lattice that wraps at each octave's
//! resolution, so the texture tiles under REPEAT sampling. The corner hash
//! is the classic `fract(sin(dot) * 43758.5453)`; `seed` shifts the sine
//! argument so each page load gets a different sky.

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Edge length of the square texture in texels.
    pub size: u32,
    pub octaves: u32,
    /// Lattice cells across the texture for the first octave.
    pub base_frequency: u32,
    pub gain: f64,
    pub lacunarity: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            size: 64,
            octaves: 2,
            base_frequency: 5,
            gain: 0.5,
            lacunarity: 2,
        }
    }
}

/// Tightly packed RGBA8 texels, row-major from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudTexture {
    pub size: u32,
    pub pixels: Vec<u8>,
}

impl CloudTexture {
    pub fn generate(settings: &NoiseSettings, seed: f64) -> Self {
        let size = settings.size.max(1);
        let texels = (size as usize).saturating_mul(size as usize);
        let mut pixels = Vec::with_capacity(texels.saturating_mul(4));
        for y in 0..size {
            for x in 0..size {
                let v = fbm(settings, x, y, seed);
                let byte = (v * 255.0).floor().clamp(0.0, 255.0) as u8;
                pixels.extend_from_slice(&[byte, byte, byte, 255]);
            }
        }
        Self { size, pixels }
    }
}

fn fbm(settings: &NoiseSettings, x: u32, y: u32, seed: f64) -> f64 {
    let mut value = 0.0;
    let mut amp = settings.gain;
    let mut res = settings.base_frequency.max(1);
    for _ in 0..settings.octaves {
        value += value_noise(settings.size.max(1), x, y, res, seed) * amp;
        amp *= settings.gain;
        res = res.saturating_mul(settings.lacunarity.max(1));
    }
    value
}

fn lattice_hash(ix: u32, iy: u32, res: u32, seed: f64) -> f64 {
    let v = ((ix % res) as f64 * 12.9898 + (iy % res) as f64 * 78.233 + seed).sin() * 43758.5453;
    v - v.floor()
}

fn smoothstep(f: f64) -> f64 {
    f * f * (3.0 - 2.0 * f)
}

fn value_noise(size: u32, x: u32, y: u32, res: u32, seed: f64) -> f64 {
    let cell = size as f64 / res as f64;
    let axis = |v: u32| {
        let t = (v % size) as f64 / cell;
        let i = t.floor();
        (i as u32, smoothstep(t - i))
    };
    let (ix, sx) = axis(x);
    let (iy, sy) = axis(y);

    let v00 = lattice_hash(ix, iy, res, seed);
    let v10 = lattice_hash(ix + 1, iy, res, seed);
    let v01 = lattice_hash(ix, iy + 1, res, seed);
    let v11 = lattice_hash(ix + 1, iy + 1, res, seed);

    v00 * (1.0 - sx) * (1.0 - sy) + v10 * sx * (1.0 - sy) + v01 * (1.0 - sx) * sy + v11 * sx * sy
}

#[cfg(test)]
mod tests {
    use super::{fbm, lattice_hash, smoothstep, value_noise, CloudTexture, NoiseSettings};
    use pretty_assertions::assert_eq;

    #[test]
    fn texture_is_opaque_grayscale() {
        let tex = CloudTexture::generate(&NoiseSettings::default(), 0.0);
        assert_eq!(tex.size, 64);
        assert_eq!(tex.pixels.len(), 64 * 64 * 4);
        for px in tex.pixels.chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn two_octaves_stay_below_three_quarters() {
        let tex = CloudTexture::generate(&NoiseSettings::default(), 0.0);
        let max = tex.pixels.chunks_exact(4).map(|p| p[0]).max().unwrap_or(0);
        assert!(max <= (0.75f64 * 255.0).floor() as u8);
    }

    #[test]
    fn seed_zero_matches_reference_hash() {
        let v = (12.9898f64 * 2.0 + 78.233 * 3.0).sin() * 43758.5453;
        assert_eq!(lattice_hash(2, 3, 5, 0.0), v - v.floor());
        // Lattice wraps at the octave resolution.
        assert_eq!(lattice_hash(7, 3, 5, 0.0), lattice_hash(2, 3, 5, 0.0));
    }

    #[test]
    fn lattice_corners_are_exact_hash_values() {
        // x = 0 sits on a lattice corner, so the blend weight is zero.
        assert_eq!(value_noise(64, 0, 0, 5, 0.0), lattice_hash(0, 0, 5, 0.0));
    }

    #[test]
    fn same_seed_is_deterministic_and_seeds_differ() {
        let s = NoiseSettings::default();
        assert_eq!(CloudTexture::generate(&s, 1.5), CloudTexture::generate(&s, 1.5));
        assert_ne!(CloudTexture::generate(&s, 0.0), CloudTexture::generate(&s, 1.5));
    }

    #[test]
    fn last_cell_blends_into_the_first_lattice_corner() {
        // 60 texels over 5 cells: texel 59 sits in cell 4, whose right
        // corner is lattice column 5, which wraps to column 0.
        let sx = smoothstep(59.0 / 12.0 - 4.0);
        let expected = lattice_hash(4, 0, 5, 0.0) * (1.0 - sx) + lattice_hash(0, 0, 5, 0.0) * sx;
        assert!((value_noise(60, 59, 0, 5, 0.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn many_octaves_saturate_instead_of_overflowing() {
        let s = NoiseSettings {
            size: 4,
            octaves: 40,
            lacunarity: 1000,
            ..NoiseSettings::default()
        };
        let v = fbm(&s, 1, 2, 0.0);
        assert!(v.is_finite() && (0.0..=1.0).contains(&v));
        assert_eq!(CloudTexture::generate(&s, 0.0).pixels.len(), 4 * 4 * 4);
    }
}
