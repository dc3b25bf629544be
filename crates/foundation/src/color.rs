use serde::{Deserialize, Serialize};

/// RGB color with channels on the 0–255 scale used by page markup.
///
/// Channels are kept as `f64` because tints are eased toward their targets a
/// fraction of a unit per frame.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn channels(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels scaled to `0.0..=1.0` for shader uniforms.
    pub fn to_unit(self) -> [f32; 3] {
        [
            (self.r / 255.0) as f32,
            (self.g / 255.0) as f32,
            (self.b / 255.0) as f32,
        ]
    }

    /// `self * weight + other * (1 - weight)`, per channel.
    pub fn mix(self, other: Rgb, weight: f64) -> Rgb {
        let keep = 1.0 - weight;
        Rgb::new(
            self.r * weight + other.r * keep,
            self.g * weight + other.g * keep,
            self.b * weight + other.b * keep,
        )
    }

    /// Largest per-channel absolute difference.
    pub fn max_delta(self, other: Rgb) -> f64 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
    }

    pub fn is_valid(self) -> bool {
        self.channels()
            .iter()
            .all(|c| c.is_finite() && (0.0..=255.0).contains(c))
    }
}

impl From<[f64; 3]> for Rgb {
    fn from(c: [f64; 3]) -> Self {
        Rgb::new(c[0], c[1], c[2])
    }
}

impl From<Rgb> for [f64; 3] {
    fn from(c: Rgb) -> Self {
        c.channels()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorParseError {
    WrongArity(usize),
    NotANumber(String),
    OutOfRange(f64),
}

impl std::fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorParseError::WrongArity(n) => {
                write!(f, "expected 3 comma-separated channels, got {n}")
            }
            ColorParseError::NotANumber(s) => write!(f, "channel is not a number: {s:?}"),
            ColorParseError::OutOfRange(v) => write!(f, "channel out of range 0..=255: {v}"),
        }
    }
}

impl std::error::Error for ColorParseError {}

/// Parses a section color attribute such as `"50, 80, 220"`.
pub fn parse_rgb_triple(text: &str) -> Result<Rgb, ColorParseError> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ColorParseError::WrongArity(parts.len()));
    }

    let mut channels = [0.0f64; 3];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        let v: f64 = part
            .parse()
            .map_err(|_| ColorParseError::NotANumber(part.to_string()))?;
        if !v.is_finite() || !(0.0..=255.0).contains(&v) {
            return Err(ColorParseError::OutOfRange(v));
        }
        *slot = v;
    }
    Ok(Rgb::from(channels))
}
