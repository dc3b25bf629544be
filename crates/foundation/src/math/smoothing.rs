//! First-order low-pass smoothing toward a moving target.
//!
//! Every animated value of the backdrop (camera height, camera tilt, tint
//! channels) eases toward its target with the same rule, applied once per
//! frame:
//!
//! `current += (target - current) * factor`
//!
//! With `factor` in `(0, 1]` each step is a strict contraction: the distance
//! to the target shrinks by `(1 - factor)` and never overshoots.

/// One smoothing step.
#[inline]
pub fn approach(current: f64, target: f64, factor: f64) -> f64 {
    current + (target - current) * factor
}

/// Returns `true` if `factor` keeps [`approach`] a contraction.
pub fn is_valid_factor(factor: f64) -> bool {
    factor.is_finite() && factor > 0.0 && factor <= 1.0
}

/// A value eased toward a target once per frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Smoothed {
    pub current: f64,
    pub target: f64,
}

impl Smoothed {
    pub fn new(value: f64) -> Self {
        Self {
            current: value,
            target: value,
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Distance still to travel.
    pub fn delta(&self) -> f64 {
        (self.target - self.current).abs()
    }

    pub fn step(&mut self, factor: f64) -> f64 {
        self.current = approach(self.current, self.target, factor);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::{Smoothed, approach, is_valid_factor};

    #[test]
    fn approach_moves_by_factor() {
        assert_eq!(approach(0.0, 10.0, 0.5), 5.0);
        assert_eq!(approach(10.0, 0.0, 0.25), 7.5);
        assert_eq!(approach(3.0, 3.0, 0.07), 3.0);
    }

    #[test]
    fn step_is_strict_contraction() {
        for factor in [0.02, 0.07, 0.5, 1.0] {
            let mut v = Smoothed { current: -40.0, target: 12.0 };
            for _ in 0..200 {
                let before = v.delta();
                v.step(factor);
                if before > 0.0 {
                    assert!(v.delta() < before, "factor {factor} did not contract");
                }
            }
        }
    }

    #[test]
    fn never_overshoots() {
        let mut v = Smoothed { current: 0.0, target: 1.0 };
        for _ in 0..1000 {
            v.step(0.07);
            assert!(v.current <= 1.0);
        }
    }

    #[test]
    fn factor_bounds() {
        assert!(is_valid_factor(0.02));
        assert!(is_valid_factor(1.0));
        assert!(!is_valid_factor(0.0));
        assert!(!is_valid_factor(1.5));
        assert!(!is_valid_factor(f64::NAN));
    }
}
