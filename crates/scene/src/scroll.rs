/// Page scroll state sampled once per frame.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ScrollSample {
    /// `window.scrollY`, CSS pixels.
    pub offset: f64,
    pub scroll_height: f64,
    pub viewport_height: f64,
}

impl ScrollSample {
    pub fn new(offset: f64, scroll_height: f64, viewport_height: f64) -> Self {
        Self {
            offset,
            scroll_height,
            viewport_height,
        }
    }

    pub fn max_offset(&self) -> f64 {
        self.scroll_height - self.viewport_height
    }

    /// Progress through the page in `0.0..=1.0`; `0.0` when it cannot scroll.
    pub fn ratio(&self) -> f64 {
        let max = self.max_offset();
        if !max.is_finite() || max <= 0.0 || !self.offset.is_finite() {
            return 0.0;
        }
        (self.offset / max).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::ScrollSample;

    #[test]
    fn ratio_spans_the_page() {
        assert_eq!(ScrollSample::new(0.0, 3000.0, 1000.0).ratio(), 0.0);
        assert_eq!(ScrollSample::new(1000.0, 3000.0, 1000.0).ratio(), 0.5);
        assert_eq!(ScrollSample::new(2000.0, 3000.0, 1000.0).ratio(), 1.0);
    }

    #[test]
    fn overscroll_is_clamped() {
        assert_eq!(ScrollSample::new(-40.0, 3000.0, 1000.0).ratio(), 0.0);
        assert_eq!(ScrollSample::new(2100.0, 3000.0, 1000.0).ratio(), 1.0);
    }

    #[test]
    fn unscrollable_page_is_zero() {
        assert_eq!(ScrollSample::new(0.0, 800.0, 800.0).ratio(), 0.0);
        assert_eq!(ScrollSample::new(10.0, 600.0, 800.0).ratio(), 0.0);
        assert_eq!(ScrollSample::default().ratio(), 0.0);
    }
}
